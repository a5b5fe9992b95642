//! Uniform argument set handed to plugins and handlers, plus small parse
//! helpers for module `parse` hooks.
//!
//! Helpers return `Result<T, Reply>` where the error is the reply the router
//! sends back, so a parse hook can use `?` and fail exactly like a
//! `stop_with` plugin.

use std::{collections::BTreeMap, sync::LazyLock};

use {
    herald_channels::{CommandOption, OptionValue, RawInput},
    herald_common::Reply,
    regex::Regex,
    serde::de::DeserializeOwned,
    serde_json::Value,
};

use crate::error::{Error, Result};

/// Arguments of one invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Args {
    #[default]
    Empty,
    /// Whitespace-split text after the command name. `raw` keeps the original
    /// spacing.
    Tokens { raw: String, tokens: Vec<String> },
    Options(Vec<CommandOption>),
    Values(Vec<String>),
    Fields(BTreeMap<String, String>),
    Target(String),
    Data(Value),
    /// Output of a module's own parse hook.
    Parsed(Value),
}

impl Args {
    /// Tokenize the text that follows a command name.
    pub fn from_text(raw: &str) -> Self {
        let raw = raw.trim();
        Self::Tokens {
            raw: raw.to_string(),
            tokens: raw.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Argument set for a non-text raw input.
    pub fn from_raw(raw: RawInput) -> Self {
        match raw {
            RawInput::Text(text) => Self::from_text(&text),
            RawInput::Options(options) => Self::Options(options),
            RawInput::Values(values) => Self::Values(values),
            RawInput::Fields(fields) => Self::Fields(fields),
            RawInput::Target(id) => Self::Target(id),
            RawInput::Data(data) => Self::Data(data),
            RawInput::None => Self::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Tokens { tokens, .. } => tokens.is_empty(),
            Self::Options(options) => options.is_empty(),
            Self::Values(values) => values.is_empty(),
            Self::Fields(fields) => fields.is_empty(),
            Self::Target(_) | Self::Data(_) | Self::Parsed(_) => false,
        }
    }

    /// Text tokens; empty for every other shape.
    pub fn tokens(&self) -> &[String] {
        match self {
            Self::Tokens { tokens, .. } => tokens,
            _ => &[],
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Tokens { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        match self {
            Self::Options(options) => options.iter().find(|o| o.name == name).map(|o| &o.value),
            _ => None,
        }
    }

    pub fn require_option(&self, name: &str) -> Result<&OptionValue> {
        match self {
            Self::Options(_) => self
                .option(name)
                .ok_or_else(|| Error::missing_argument(name)),
            _ => Err(Error::wrong_shape("options")),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Deserialize the output of a parse hook (or raw external data).
    pub fn parsed<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Parsed(value) | Self::Data(value) => Ok(T::deserialize(value)?),
            _ => Err(Error::wrong_shape("parsed")),
        }
    }
}

// ── Parse helpers ───────────────────────────────────────────────────────────

/// Patterns recognized by [`parse_bool_with`].
#[derive(Debug, Clone)]
pub struct BoolPatterns {
    pub yes: Regex,
    pub no: Regex,
}

static DEFAULT_BOOL_PATTERNS: LazyLock<Option<BoolPatterns>> = LazyLock::new(|| {
    Some(BoolPatterns {
        yes: Regex::new(r"(?i)^(?:yes|y|true|👍)$").ok()?,
        no: Regex::new(r"(?i)^(?:no|n|false|👎)$").ok()?,
    })
});

/// Parse a signed integer.
pub fn parse_int(arg: &str, on_failure: impl Into<Reply>) -> std::result::Result<i64, Reply> {
    arg.trim().parse().map_err(|_| on_failure.into())
}

/// Parse a yes/no style answer with the default patterns
/// (`yes`, `y`, `true`, 👍 / `no`, `n`, `false`, 👎; case-insensitive).
pub fn parse_bool(arg: &str, on_failure: impl Into<Reply>) -> std::result::Result<bool, Reply> {
    match DEFAULT_BOOL_PATTERNS.as_ref() {
        Some(patterns) => parse_bool_with(arg, on_failure, patterns),
        None => Err(on_failure.into()),
    }
}

pub fn parse_bool_with(
    arg: &str,
    on_failure: impl Into<Reply>,
    patterns: &BoolPatterns,
) -> std::result::Result<bool, Reply> {
    let arg = arg.trim();
    if patterns.yes.is_match(arg) {
        Ok(true)
    } else if patterns.no.is_match(arg) {
        Ok(false)
    } else {
        Err(on_failure.into())
    }
}

/// Split on `sep`, trimming items and dropping empty ones.
pub fn to_list(arg: &str, sep: &str) -> Vec<String> {
    arg.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an integer and force it non-negative.
pub fn to_positive_int(
    arg: &str,
    on_failure: impl Into<Reply>,
) -> std::result::Result<i64, Reply> {
    parse_int(arg, on_failure).map(i64::saturating_abs)
}

/// Parse an integer and force it non-positive.
pub fn to_negative_int(
    arg: &str,
    on_failure: impl Into<Reply>,
) -> std::result::Result<i64, Reply> {
    parse_int(arg, on_failure).map(|n| -n.saturating_abs())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_tokenized_on_whitespace() {
        let args = Args::from_text("  alice   too  spammy ");
        assert_eq!(args.tokens(), ["alice", "too", "spammy"]);
        assert_eq!(args.raw_text(), Some("alice   too  spammy"));
        assert!(Args::from_text("   ").is_empty());
    }

    #[test]
    fn raw_input_maps_to_matching_shape() {
        let args = Args::from_raw(RawInput::Options(vec![CommandOption::new(
            "user",
            OptionValue::User("42".into()),
        )]));
        assert_eq!(args.option("user"), Some(&OptionValue::User("42".into())));
        assert!(args.option("reason").is_none());
        assert!(matches!(
            args.require_option("reason"),
            Err(Error::MissingArgument { .. })
        ));
        assert_eq!(Args::from_raw(RawInput::None), Args::Empty);
        assert_eq!(
            Args::from_raw(RawInput::Target("m1".into())),
            Args::Target("m1".into())
        );
    }

    #[test]
    fn require_option_on_tokens_is_wrong_shape() {
        let args = Args::from_text("x");
        assert!(matches!(
            args.require_option("x"),
            Err(Error::WrongShape { .. })
        ));
    }

    #[test]
    fn parsed_values_deserialize() {
        let args = Args::Parsed(serde_json::json!({ "sides": 6 }));
        #[derive(serde::Deserialize)]
        struct Roll {
            sides: u32,
        }
        assert_eq!(args.parsed::<Roll>().unwrap().sides, 6);
        assert!(Args::Empty.parsed::<Roll>().is_err());
    }

    #[test]
    fn parse_int_reports_failure_reply() {
        assert_eq!(parse_int("12", "Expected a number"), Ok(12));
        assert_eq!(parse_int(" -3 ", "Expected a number"), Ok(-3));
        let err = parse_int("abc", "Expected a number").unwrap_err();
        assert_eq!(err.text, "Expected a number");
    }

    #[test]
    fn parse_bool_defaults() {
        for yes in ["yes", "Y", "true", "👍"] {
            assert_eq!(parse_bool(yes, "?"), Ok(true), "{yes}");
        }
        for no in ["no", "N", "FALSE", "👎"] {
            assert_eq!(parse_bool(no, "?"), Ok(false), "{no}");
        }
        assert!(parse_bool("any", "?").is_err());
    }

    #[test]
    fn parse_bool_with_custom_patterns() {
        let patterns = BoolPatterns {
            yes: Regex::new("^oui$").unwrap(),
            no: Regex::new("^non$").unwrap(),
        };
        assert_eq!(parse_bool_with("oui", "?", &patterns), Ok(true));
        assert_eq!(parse_bool_with("non", "?", &patterns), Ok(false));
        assert!(parse_bool_with("yes", "?", &patterns).is_err());
    }

    #[test]
    fn list_and_signed_helpers() {
        assert_eq!(to_list("a, b,,c ", ","), vec!["a", "b", "c"]);
        assert_eq!(to_positive_int("-5", "?"), Ok(5));
        assert_eq!(to_negative_int("5", "?"), Ok(-5));
        assert_eq!(to_negative_int("-5", "?"), Ok(-5));
        assert!(to_positive_int("five", "?").is_err());
    }
}
