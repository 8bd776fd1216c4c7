//! Slash-command parsing, caller identity and the generated help embed.
//!
//! A command line looks like `/name arg arg key:value key:"quoted value"`.
//! Named arguments may appear in any order; bare arguments fill the
//! remaining parameters in declaration order, and surplus words are joined
//! onto the last parameter so `/buy rope of climbing` needs no quotes.

use log::trace;
use std::collections::BTreeMap;
use thiserror::Error;

use super::reply::Embed;
use crate::game::currency::{parse_coins, Coins};
use crate::game::errors::{GameError, GameResult};

/// Who sent a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub display_name: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            is_admin: false,
        }
    }

    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn mention(&self) -> String {
        mention(&self.user_id)
    }
}

pub fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
}

pub const fn req(name: &'static str) -> ParamSpec {
    ParamSpec { name, required: true }
}

pub const fn opt(name: &'static str) -> ParamSpec {
    ParamSpec { name, required: false }
}

/// One entry of a persona's command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub admin_only: bool,
    pub params: &'static [ParamSpec],
}

impl CommandSpec {
    /// `/name <required> [optional]`
    pub fn usage(&self) -> String {
        let mut out = format!("/{}", self.name);
        for p in self.params {
            if p.required {
                out.push_str(&format!(" <{}>", p.name));
            } else {
                out.push_str(&format!(" [{}]", p.name));
            }
        }
        out
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("not a command")]
    NotACommand,
    #[error("unknown command `/{0}`")]
    UnknownCommand(String),
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("missing `{param}`; usage: `{usage}`")]
    MissingParam { param: String, usage: String },
    #[error("too many arguments; usage: `{0}`")]
    TooManyArgs(String),
}

/// Parsed arguments of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: BTreeMap<&'static str, String>,
}

impl Args {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// A required text argument.
    pub fn text(&self, name: &str) -> GameResult<&str> {
        self.get(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GameError::InvalidArgument(format!("`{}` is required", name)))
    }

    pub fn int(&self, name: &str) -> GameResult<Option<i64>> {
        self.get(name)
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| GameError::InvalidArgument(format!("`{}` must be a whole number", name)))
            })
            .transpose()
    }

    pub fn int_or(&self, name: &str, default: i64) -> GameResult<i64> {
        Ok(self.int(name)?.unwrap_or(default))
    }

    pub fn flag(&self, name: &str) -> GameResult<Option<bool>> {
        self.get(name)
            .map(|v| match v.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Ok(true),
                "false" | "no" | "n" | "0" | "off" => Ok(false),
                _ => Err(GameError::InvalidArgument(format!("`{}` must be true or false", name))),
            })
            .transpose()
    }

    /// A member argument as a bare user id. Accepts `<@id>`, `<@!id>`, `@id` or `id`.
    pub fn member(&self, name: &str) -> GameResult<Option<String>> {
        let Some(raw) = self.get(name) else {
            return Ok(None);
        };
        let id = raw
            .trim()
            .trim_start_matches("<@")
            .trim_start_matches('!')
            .trim_start_matches('@')
            .trim_end_matches('>')
            .trim();
        if id.is_empty() {
            return Err(GameError::InvalidArgument(format!("`{}` must name a member", name)));
        }
        Ok(Some(id.to_string()))
    }

    /// Coins from optional `gp`, `sp` and `cp` arguments. `gp` also accepts
    /// a full amount such as `5gp 3sp`.
    pub fn coins(&self) -> GameResult<Coins> {
        let mut coins = match self.get("gp") {
            Some(v) => parse_coins(v)?,
            None => Coins::default(),
        };
        for (name, slot) in [("sp", &mut coins.sp), ("cp", &mut coins.cp)] {
            if let Some(v) = self.int(name)? {
                if v < 0 {
                    return Err(GameError::InvalidArgument(format!("`{}` cannot be negative", name)));
                }
                *slot = slot.saturating_add(v as u64);
            }
        }
        Ok(coins)
    }
}

/// Split a command body into words, honouring double quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse one line against a command table.
pub fn parse<'t>(line: &str, table: &'t [CommandSpec]) -> Result<(&'t CommandSpec, Args), ParseError> {
    let trimmed = line.trim();
    let Some(body) = trimmed.strip_prefix('/') else {
        return Err(ParseError::NotACommand);
    };
    let (name, rest) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], &body[pos..]),
        None => (body, ""),
    };
    if name.is_empty() {
        return Err(ParseError::NotACommand);
    }
    let spec = table
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ParseError::UnknownCommand(name.to_lowercase()))?;

    let mut args = Args::default();
    let mut positional = Vec::new();
    for token in tokenize(rest)? {
        let named = token.split_once(':').and_then(|(key, value)| {
            spec.params
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(key))
                .map(|p| (p.name, value.to_string()))
        });
        match named {
            Some((key, value)) => {
                args.values.insert(key, value);
            }
            None => positional.push(token),
        }
    }

    let unfilled: Vec<&'static str> = spec
        .params
        .iter()
        .map(|p| p.name)
        .filter(|name| !args.values.contains_key(name))
        .collect();
    let mut open = unfilled.into_iter();
    let mut last_filled: Option<&'static str> = None;
    for token in positional {
        match open.next() {
            Some(name) => {
                args.values.insert(name, token);
                last_filled = Some(name);
            }
            None => match last_filled.and_then(|k| args.values.get_mut(k)) {
                Some(value) => {
                    value.push(' ');
                    value.push_str(&token);
                }
                None => return Err(ParseError::TooManyArgs(spec.usage())),
            },
        }
    }

    if let Some(missing) = spec.params.iter().find(|p| p.required && !args.values.contains_key(p.name)) {
        return Err(ParseError::MissingParam {
            param: missing.name.to_string(),
            usage: spec.usage(),
        });
    }
    trace!("Parsed /{} with {:?}", spec.name, args.values);
    Ok((spec, args))
}

/// Help embed with general and admin sections, each split into fields of
/// at most `field_limit` characters.
pub fn help_embed(title: &str, table: &[CommandSpec], field_limit: usize) -> Embed {
    let entry = |c: &CommandSpec| format!("**/{}** - {}", c.name, c.description);
    let general: Vec<String> = table.iter().filter(|c| !c.admin_only).map(entry).collect();
    let admin: Vec<String> = table.iter().filter(|c| c.admin_only).map(entry).collect();

    let mut embed = Embed::new(title);
    if !general.is_empty() {
        embed = embed.split_field("🧪 General Commands", &general.join("\n"), field_limit);
    }
    if !admin.is_empty() {
        embed = embed.split_field("⚙️ Admin Commands", &admin.join("\n"), field_limit);
    }
    embed
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[CommandSpec] = &[
        CommandSpec {
            name: "buy",
            description: "Buy an item.",
            admin_only: false,
            params: &[req("item")],
        },
        CommandSpec {
            name: "givegold",
            description: "Give gold.",
            admin_only: false,
            params: &[req("member"), opt("gp"), opt("sp"), opt("cp")],
        },
        CommandSpec {
            name: "audit_log",
            description: "Recent transactions.",
            admin_only: true,
            params: &[opt("limit")],
        },
    ];

    #[test]
    fn tokenizer_keeps_quoted_words_together() {
        assert_eq!(
            tokenize(r#" item:"rope (50 feet)"  "Wild Sageroot" 3"#).unwrap(),
            vec!["item:rope (50 feet)", "Wild Sageroot", "3"]
        );
        assert_eq!(tokenize(r#""""#).unwrap(), vec![""]);
        assert_eq!(tokenize(r#"item:"open"#), Err(ParseError::UnterminatedQuote));
    }

    #[test]
    fn named_and_positional_arguments() {
        let (spec, args) = parse("/givegold gp:5 <@42> 3", TABLE).unwrap();
        assert_eq!(spec.name, "givegold");
        assert_eq!(args.member("member").unwrap().as_deref(), Some("42"));
        assert_eq!(args.coins().unwrap(), Coins::new(5, 3, 0));
    }

    #[test]
    fn surplus_words_join_the_last_parameter() {
        let (_, args) = parse("/buy rope of climbing", TABLE).unwrap();
        assert_eq!(args.text("item").unwrap(), "rope of climbing");
        let (_, args) = parse(r#"/BUY item:"Potion: Healing""#, TABLE).unwrap();
        assert_eq!(args.text("item").unwrap(), "Potion: Healing");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse("hello there", TABLE).unwrap_err(), ParseError::NotACommand);
        assert_eq!(
            parse("/dance", TABLE).unwrap_err(),
            ParseError::UnknownCommand("dance".into())
        );
        assert!(matches!(
            parse("/buy", TABLE).unwrap_err(),
            ParseError::MissingParam { ref param, .. } if param == "item"
        ));
        assert!(matches!(parse("/audit_log 5", TABLE), Ok(_)));
    }

    #[test]
    fn typed_accessors_reject_bad_values() {
        let (_, args) = parse("/audit_log many", TABLE).unwrap();
        assert!(matches!(args.int("limit"), Err(GameError::InvalidArgument(_))));
        let (_, args) = parse("/givegold 42 5gp sp:-1", TABLE).unwrap();
        assert!(args.coins().is_err());
        let (_, args) = parse(r#"/givegold 42 "2gp 5cp""#, TABLE).unwrap();
        assert_eq!(args.coins().unwrap(), Coins::new(2, 0, 5));
    }

    #[test]
    fn help_has_general_and_admin_sections() {
        let embed = help_embed("📜 Stanley's Commands", TABLE, 1024);
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "🧪 General Commands");
        assert!(embed.fields[0].value.contains("**/buy** - Buy an item."));
        assert_eq!(embed.fields[1].name, "⚙️ Admin Commands");
        assert_eq!(TABLE[1].usage(), "/givegold <member> [gp] [sp] [cp]");
    }
}
