//! Normalized inbound events.
//!
//! Every platform event is turned into one [`Payload`] variant. The variant
//! keeps the source-specific data; [`Payload::envelope`] projects it onto the
//! common `{source_id, author_id, raw}` shape the router works with.

use std::{collections::BTreeMap, fmt, time::SystemTime};

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

// ── PayloadKind ─────────────────────────────────────────────────────────────

/// Fieldless tag of a [`Payload`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    TextMessage,
    InteractionCommand,
    ComponentButton,
    ComponentSelect,
    ModalSubmit,
    ContextMenuUser,
    ContextMenuMessage,
    ScheduledTick,
    ExternalEvent,
}

impl PayloadKind {
    /// All variants, for iteration.
    pub const ALL: &'static [PayloadKind] = &[
        Self::TextMessage,
        Self::InteractionCommand,
        Self::ComponentButton,
        Self::ComponentSelect,
        Self::ModalSubmit,
        Self::ContextMenuUser,
        Self::ContextMenuMessage,
        Self::ScheduledTick,
        Self::ExternalEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextMessage => "text_message",
            Self::InteractionCommand => "interaction_command",
            Self::ComponentButton => "component_button",
            Self::ComponentSelect => "component_select",
            Self::ModalSubmit => "modal_submit",
            Self::ContextMenuUser => "context_menu_user",
            Self::ContextMenuMessage => "context_menu_message",
            Self::ScheduledTick => "scheduled_tick",
            Self::ExternalEvent => "external_event",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Variant data ────────────────────────────────────────────────────────────

/// A plain chat message that may carry a prefixed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub message_id: String,
    pub channel_id: String,
    /// `None` for direct messages.
    pub guild_id: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
}

impl TextMessage {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// Fields shared by every interaction-style event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMeta {
    pub interaction_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub user_id: String,
}

/// A typed option value supplied with an interaction command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(String),
    Channel(String),
    Role(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::User(s) | Self::Channel(s) | Self::Role(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub value: OptionValue,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionCommand {
    #[serde(flatten)]
    pub meta: InteractionMeta,
    pub command_name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentButton {
    #[serde(flatten)]
    pub meta: InteractionMeta,
    pub custom_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSelect {
    #[serde(flatten)]
    pub meta: InteractionMeta,
    pub custom_id: String,
    pub message_id: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSubmit {
    #[serde(flatten)]
    pub meta: InteractionMeta,
    pub custom_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenuUser {
    #[serde(flatten)]
    pub meta: InteractionMeta,
    pub command_name: String,
    pub target_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenuMessage {
    #[serde(flatten)]
    pub meta: InteractionMeta,
    pub command_name: String,
    pub target_message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTick {
    pub task_name: String,
    pub fired_at: SystemTime,
}

/// An event emitted by something other than the chat platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// Who emitted it (a service name, a webhook id, ...).
    pub emitter: String,
    pub event_name: String,
    #[serde(default)]
    pub data: Value,
}

// ── Payload ─────────────────────────────────────────────────────────────────

/// One classified inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    TextMessage(TextMessage),
    InteractionCommand(InteractionCommand),
    ComponentButton(ComponentButton),
    ComponentSelect(ComponentSelect),
    ModalSubmit(ModalSubmit),
    ContextMenuUser(ContextMenuUser),
    ContextMenuMessage(ContextMenuMessage),
    ScheduledTick(ScheduledTick),
    ExternalEvent(ExternalEvent),
}

/// Raw, not yet module-parsed input carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RawInput {
    Text(String),
    Options(Vec<CommandOption>),
    Values(Vec<String>),
    Fields(BTreeMap<String, String>),
    /// The id a context-menu command was invoked on.
    Target(String),
    Data(Value),
    None,
}

/// The source-independent view of a [`Payload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Channel the event came from, or the emitter/scheduler for non-chat events.
    pub source_id: String,
    /// Invoking user, or the emitter/scheduler for non-chat events.
    pub author_id: String,
    pub raw: RawInput,
}

const SCHEDULER_ID: &str = "scheduler";

impl Payload {
    /// Returns the [`PayloadKind`] that matches this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::TextMessage(_) => PayloadKind::TextMessage,
            Self::InteractionCommand(_) => PayloadKind::InteractionCommand,
            Self::ComponentButton(_) => PayloadKind::ComponentButton,
            Self::ComponentSelect(_) => PayloadKind::ComponentSelect,
            Self::ModalSubmit(_) => PayloadKind::ModalSubmit,
            Self::ContextMenuUser(_) => PayloadKind::ContextMenuUser,
            Self::ContextMenuMessage(_) => PayloadKind::ContextMenuMessage,
            Self::ScheduledTick(_) => PayloadKind::ScheduledTick,
            Self::ExternalEvent(_) => PayloadKind::ExternalEvent,
        }
    }

    /// Interaction metadata, for the interaction-family variants.
    pub fn interaction(&self) -> Option<&InteractionMeta> {
        match self {
            Self::InteractionCommand(e) => Some(&e.meta),
            Self::ComponentButton(e) => Some(&e.meta),
            Self::ComponentSelect(e) => Some(&e.meta),
            Self::ModalSubmit(e) => Some(&e.meta),
            Self::ContextMenuUser(e) => Some(&e.meta),
            Self::ContextMenuMessage(e) => Some(&e.meta),
            Self::TextMessage(_) | Self::ScheduledTick(_) | Self::ExternalEvent(_) => None,
        }
    }

    /// The guild the event happened in, if any.
    pub fn guild_id(&self) -> Option<&str> {
        match self {
            Self::TextMessage(m) => m.guild_id.as_deref(),
            other => other.interaction().and_then(|m| m.guild_id.as_deref()),
        }
    }

    pub fn source_id(&self) -> &str {
        match self {
            Self::TextMessage(m) => &m.channel_id,
            Self::ScheduledTick(_) => SCHEDULER_ID,
            Self::ExternalEvent(e) => &e.emitter,
            other => other
                .interaction()
                .map_or(SCHEDULER_ID, |m| m.channel_id.as_str()),
        }
    }

    pub fn author_id(&self) -> &str {
        match self {
            Self::TextMessage(m) => &m.author_id,
            Self::ScheduledTick(_) => SCHEDULER_ID,
            Self::ExternalEvent(e) => &e.emitter,
            other => other
                .interaction()
                .map_or(SCHEDULER_ID, |m| m.user_id.as_str()),
        }
    }

    /// Project onto the normalized envelope.
    pub fn envelope(&self) -> Envelope {
        let raw = match self {
            Self::TextMessage(m) => RawInput::Text(m.content.clone()),
            Self::InteractionCommand(c) => RawInput::Options(c.options.clone()),
            Self::ComponentButton(_) | Self::ScheduledTick(_) => RawInput::None,
            Self::ComponentSelect(s) => RawInput::Values(s.values.clone()),
            Self::ModalSubmit(m) => RawInput::Fields(m.fields.clone()),
            Self::ContextMenuUser(c) => RawInput::Target(c.target_user_id.clone()),
            Self::ContextMenuMessage(c) => RawInput::Target(c.target_message_id.clone()),
            Self::ExternalEvent(e) => RawInput::Data(e.data.clone()),
        };
        Envelope {
            source_id: self.source_id().to_string(),
            author_id: self.author_id().to_string(),
            raw,
        }
    }
}

impl From<TextMessage> for Payload {
    fn from(m: TextMessage) -> Self {
        Self::TextMessage(m)
    }
}

impl From<InteractionCommand> for Payload {
    fn from(c: InteractionCommand) -> Self {
        Self::InteractionCommand(c)
    }
}

impl From<ComponentButton> for Payload {
    fn from(b: ComponentButton) -> Self {
        Self::ComponentButton(b)
    }
}

impl From<ComponentSelect> for Payload {
    fn from(s: ComponentSelect) -> Self {
        Self::ComponentSelect(s)
    }
}

impl From<ModalSubmit> for Payload {
    fn from(m: ModalSubmit) -> Self {
        Self::ModalSubmit(m)
    }
}

impl From<ContextMenuUser> for Payload {
    fn from(c: ContextMenuUser) -> Self {
        Self::ContextMenuUser(c)
    }
}

impl From<ContextMenuMessage> for Payload {
    fn from(c: ContextMenuMessage) -> Self {
        Self::ContextMenuMessage(c)
    }
}

impl From<ScheduledTick> for Payload {
    fn from(t: ScheduledTick) -> Self {
        Self::ScheduledTick(t)
    }
}

impl From<ExternalEvent> for Payload {
    fn from(e: ExternalEvent) -> Self {
        Self::ExternalEvent(e)
    }
}
