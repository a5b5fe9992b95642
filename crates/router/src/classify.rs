//! Turn a payload into a command name plus arguments, or drop it.

use {
    herald_channels::{Payload, TextMessage},
    herald_config::RouterConfig,
    herald_plugins::Args,
};

/// Why a payload was dropped before lookup. Dropping is not an error and
/// produces no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Bot,
    DirectMessage,
    NoPrefix,
    EmptyCommand,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::DirectMessage => "direct_message",
            Self::NoPrefix => "no_prefix",
            Self::EmptyCommand => "empty_command",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Ignored(IgnoreReason),
    Command { name: String, args: Args },
}

pub fn classify(payload: &Payload, config: &RouterConfig) -> Classified {
    let name = match payload {
        Payload::TextMessage(message) => return classify_text(message, config),
        Payload::InteractionCommand(c) => &c.command_name,
        Payload::ComponentButton(b) => &b.custom_id,
        Payload::ComponentSelect(s) => &s.custom_id,
        Payload::ModalSubmit(m) => &m.custom_id,
        Payload::ContextMenuUser(c) => &c.command_name,
        Payload::ContextMenuMessage(c) => &c.command_name,
        Payload::ScheduledTick(t) => &t.task_name,
        Payload::ExternalEvent(e) => &e.event_name,
    };
    if name.is_empty() {
        return Classified::Ignored(IgnoreReason::EmptyCommand);
    }
    Classified::Command {
        name: name.clone(),
        args: Args::from_raw(payload.envelope().raw),
    }
}

fn classify_text(message: &TextMessage, config: &RouterConfig) -> Classified {
    if message.author_is_bot && config.ignore_bots {
        return Classified::Ignored(IgnoreReason::Bot);
    }
    if message.is_direct() && !config.allow_direct_messages {
        return Classified::Ignored(IgnoreReason::DirectMessage);
    }
    let Some(rest) = strip_prefix(&message.content, &config.prefix, config.case_insensitive_prefix)
    else {
        return Classified::Ignored(IgnoreReason::NoPrefix);
    };

    let rest = rest.trim_start();
    let (name, remainder) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    if name.is_empty() {
        return Classified::Ignored(IgnoreReason::EmptyCommand);
    }
    Classified::Command {
        name: name.to_string(),
        args: Args::from_text(remainder),
    }
}

fn strip_prefix<'a>(content: &'a str, prefix: &str, case_insensitive: bool) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    if !case_insensitive {
        return content.strip_prefix(prefix);
    }
    let head = content.get(..prefix.len())?;
    if head.to_lowercase() == prefix.to_lowercase() {
        content.get(prefix.len()..)
    } else {
        None
    }
}
