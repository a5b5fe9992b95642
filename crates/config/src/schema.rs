//! Config schema types (router, reply messages, logging).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub router: RouterConfig,
    pub messages: MessagesConfig,
    pub logging: LoggingConfig,
}

/// Event router behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix a text message must start with to be treated as a command.
    pub prefix: String,
    /// Compare the prefix case-insensitively (useful for word prefixes like `bot `).
    pub case_insensitive_prefix: bool,
    /// Bounded capacity of the shared fan-in queue.
    pub channel_capacity: usize,
    /// Drop text messages authored by bots.
    pub ignore_bots: bool,
    /// Route text commands sent in direct messages.
    pub allow_direct_messages: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            case_insensitive_prefix: false,
            channel_capacity: 256,
            ignore_bots: true,
            allow_direct_messages: false,
        }
    }
}

/// Replies the router sends on its own behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Sent when no module matches the event.
    pub unknown_command: String,
    /// Sent when a text command only exists as another kind (e.g. slash-only).
    pub wrong_kind: String,
    /// Generic reply for plugin failures and handler errors.
    pub failure: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            unknown_command: "Unknown command".into(),
            wrong_kind: "This may be a slash command and not a text command".into(),
            failure: "Something went wrong while running that command".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}
