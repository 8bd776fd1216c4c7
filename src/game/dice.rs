//! Randomness seam for every roll the bots make.
//!
//! Handlers take a `&mut dyn Roller` so tests can script exact outcomes with
//! [`ScriptedRoller`] while production uses [`ThreadRoller`].

use rand::Rng;
use std::collections::VecDeque;

pub trait Roller: Send {
    /// Inclusive integer range.
    fn range(&mut self, lo: i64, hi: i64) -> i64;

    /// Uniform float in `[0, 1)`.
    fn chance(&mut self) -> f64;

    /// A twenty-sided die.
    fn d20(&mut self) -> i64 {
        self.range(1, 20)
    }

    /// Index into a collection of `len` items. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        self.range(0, len as i64 - 1) as usize
    }
}

/// Production roller backed by `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRoller;

impl Roller for ThreadRoller {
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        rand::thread_rng().gen_range(lo..=hi)
    }

    fn chance(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Replays queued values in order. Integer requests are clamped into the
/// requested range; once a queue runs dry the low end of the range (or 0.0)
/// is returned.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRoller {
    ints: VecDeque<i64>,
    floats: VecDeque<f64>,
}

impl ScriptedRoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ints(ints: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ints: ints.into_iter().collect(),
            floats: VecDeque::new(),
        }
    }

    pub fn push_int(&mut self, v: i64) -> &mut Self {
        self.ints.push_back(v);
        self
    }

    pub fn push_float(&mut self, v: f64) -> &mut Self {
        self.floats.push_back(v);
        self
    }

    pub fn remaining(&self) -> usize {
        self.ints.len() + self.floats.len()
    }
}

impl Roller for ScriptedRoller {
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        match self.ints.pop_front() {
            Some(v) => v.clamp(lo, hi.max(lo)),
            None => lo,
        }
    }

    fn chance(&mut self) -> f64 {
        self.floats.pop_front().unwrap_or(0.0)
    }
}
