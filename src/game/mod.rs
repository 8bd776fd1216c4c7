//! # Game Rules
//!
//! Plain data types for every JSON document plus the rules that mutate them.
//! Nothing here touches the filesystem; the bot layer loads documents through
//! [`crate::storage::JsonStore`], hands them to these functions, and stages
//! the results back.
//!
//! ```text
//! check ◀── alchemy, herbalism          (d20 rule)
//! dice  ◀── everything random           (Roller seam)
//! currency ◀── gold, shop, market       (gp / sp / cp)
//! inventory ◀── alchemy, herbalism, market, shop
//! ```

pub mod alchemy;
pub mod audit;
pub mod check;
pub mod clock;
pub mod currency;
pub mod dice;
pub mod errors;
pub mod gold;
pub mod herbalism;
pub mod inventory;
pub mod market;
pub mod requests;
pub mod responses;
pub mod shop;
pub mod stats;

pub use check::{resolve, Check, CheckModifiers, CheckOutcome};
pub use currency::Coins;
pub use dice::{Roller, ScriptedRoller, ThreadRoller};
pub use errors::{GameError, GameResult};
