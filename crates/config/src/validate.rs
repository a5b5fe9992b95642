//! Semantic validation of a loaded [`HeraldConfig`].

use crate::schema::HeraldConfig;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "router", "messages", "logging"
    pub category: &'static str,
    /// Dotted path, e.g. "router.prefix"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, category: &'static str, path: &str, message: &str) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.to_string(),
            message: message.to_string(),
        });
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub fn validate(config: &HeraldConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let router = &config.router;

    if router.prefix.is_empty() {
        result.push(
            Severity::Error,
            "router",
            "router.prefix",
            "prefix must not be empty",
        );
    } else if router.prefix.chars().any(char::is_whitespace) && !router.prefix.ends_with(' ') {
        result.push(
            Severity::Warning,
            "router",
            "router.prefix",
            "prefix contains whitespace; only a trailing space is tokenized predictably",
        );
    }

    if router.channel_capacity == 0 {
        result.push(
            Severity::Error,
            "router",
            "router.channel_capacity",
            "channel capacity must be at least 1",
        );
    }

    let messages = [
        ("messages.unknown_command", &config.messages.unknown_command),
        ("messages.wrong_kind", &config.messages.wrong_kind),
        ("messages.failure", &config.messages.failure),
    ];
    for (path, text) in messages {
        if text.trim().is_empty() {
            result.push(
                Severity::Warning,
                "messages",
                path,
                "empty reply text; users will receive a blank message",
            );
        }
    }

    // Full filter directives (`herald_router=debug`) are accepted as-is.
    let level = config.logging.level.as_str();
    if !level.contains('=') && !LOG_LEVELS.contains(&level) {
        result.push(
            Severity::Warning,
            "logging",
            "logging.level",
            "unrecognized log level, falling back to info",
        );
    }

    result
}
