//! Module types, namespaces, and which payloads each type accepts.

use std::{fmt, str::FromStr};

use {
    herald_channels::PayloadKind,
    serde::{Deserialize, Serialize},
};

/// What kind of event a module handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// Prefixed text command.
    Text,
    /// Slash command.
    Interactive,
    /// Reachable both as a text command and as a slash command.
    Both,
    ComponentButton,
    ComponentSelect,
    ModalSubmit,
    ContextMenuUser,
    ContextMenuMessage,
    Scheduled,
    ExternalEvent,
}

impl ModuleType {
    pub const ALL: &'static [ModuleType] = &[
        Self::Text,
        Self::Interactive,
        Self::Both,
        Self::ComponentButton,
        Self::ComponentSelect,
        Self::ModalSubmit,
        Self::ContextMenuUser,
        Self::ContextMenuMessage,
        Self::Scheduled,
        Self::ExternalEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Interactive => "interactive",
            Self::Both => "both",
            Self::ComponentButton => "component_button",
            Self::ComponentSelect => "component_select",
            Self::ModalSubmit => "modal_submit",
            Self::ContextMenuUser => "context_menu_user",
            Self::ContextMenuMessage => "context_menu_message",
            Self::Scheduled => "scheduled",
            Self::ExternalEvent => "external_event",
        }
    }

    /// Namespaces a module of this type occupies. Names must be unique
    /// within each of them.
    pub fn namespaces(&self) -> &'static [Namespace] {
        match self {
            Self::Text => &[Namespace::Text],
            Self::Interactive => &[Namespace::Interactive],
            Self::Both => &[Namespace::Text, Namespace::Interactive],
            Self::ComponentButton => &[Namespace::ComponentButton],
            Self::ComponentSelect => &[Namespace::ComponentSelect],
            Self::ModalSubmit => &[Namespace::ModalSubmit],
            Self::ContextMenuUser => &[Namespace::ContextMenuUser],
            Self::ContextMenuMessage => &[Namespace::ContextMenuMessage],
            Self::Scheduled => &[Namespace::Scheduled],
            Self::ExternalEvent => &[Namespace::ExternalEvent],
        }
    }

    /// Whether modules of this type show up as platform commands.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Interactive | Self::Both | Self::ContextMenuUser | Self::ContextMenuMessage
        )
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`ModuleType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module type `{0}`")]
pub struct UnknownModuleType(pub String);

impl FromStr for ModuleType {
    type Err = UnknownModuleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownModuleType(s.to_string()))
    }
}

/// A name space of the registry. Each payload kind looks names up in exactly
/// one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Text,
    Interactive,
    ComponentButton,
    ComponentSelect,
    ModalSubmit,
    ContextMenuUser,
    ContextMenuMessage,
    Scheduled,
    ExternalEvent,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Interactive => "interactive",
            Self::ComponentButton => "component_button",
            Self::ComponentSelect => "component_select",
            Self::ModalSubmit => "modal_submit",
            Self::ContextMenuUser => "context_menu_user",
            Self::ContextMenuMessage => "context_menu_message",
            Self::Scheduled => "scheduled",
            Self::ExternalEvent => "external_event",
        }
    }

    pub fn for_payload(kind: PayloadKind) -> Self {
        match kind {
            PayloadKind::TextMessage => Self::Text,
            PayloadKind::InteractionCommand => Self::Interactive,
            PayloadKind::ComponentButton => Self::ComponentButton,
            PayloadKind::ComponentSelect => Self::ComponentSelect,
            PayloadKind::ModalSubmit => Self::ModalSubmit,
            PayloadKind::ContextMenuUser => Self::ContextMenuUser,
            PayloadKind::ContextMenuMessage => Self::ContextMenuMessage,
            PayloadKind::ScheduledTick => Self::Scheduled,
            PayloadKind::ExternalEvent => Self::ExternalEvent,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module types that may handle a payload of `kind`.
pub fn accepted_types(kind: PayloadKind) -> &'static [ModuleType] {
    match kind {
        PayloadKind::TextMessage => &[ModuleType::Text, ModuleType::Both],
        PayloadKind::InteractionCommand => &[ModuleType::Interactive, ModuleType::Both],
        PayloadKind::ComponentButton => &[ModuleType::ComponentButton],
        PayloadKind::ComponentSelect => &[ModuleType::ComponentSelect],
        PayloadKind::ModalSubmit => &[ModuleType::ModalSubmit],
        PayloadKind::ContextMenuUser => &[ModuleType::ContextMenuUser],
        PayloadKind::ContextMenuMessage => &[ModuleType::ContextMenuMessage],
        PayloadKind::ScheduledTick => &[ModuleType::Scheduled],
        PayloadKind::ExternalEvent => &[ModuleType::ExternalEvent],
    }
}

pub fn accepts(module: ModuleType, kind: PayloadKind) -> bool {
    accepted_types(kind).contains(&module)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_accepts_text_and_interactive_only() {
        assert!(accepts(ModuleType::Both, PayloadKind::TextMessage));
        assert!(accepts(ModuleType::Both, PayloadKind::InteractionCommand));
        assert!(!accepts(ModuleType::Both, PayloadKind::ComponentButton));
        assert!(!accepts(ModuleType::Text, PayloadKind::InteractionCommand));
    }

    #[test]
    fn table_is_consistent_with_namespaces() {
        for &kind in PayloadKind::ALL {
            let ns = Namespace::for_payload(kind);
            for module in accepted_types(kind) {
                assert!(
                    module.namespaces().contains(&ns),
                    "{module} accepted for {kind} but not in {ns}"
                );
            }
        }
    }

    #[test]
    fn every_payload_kind_has_an_accepting_type() {
        for &kind in PayloadKind::ALL {
            assert!(!accepted_types(kind).is_empty(), "{kind}");
        }
    }

    #[test]
    fn parses_type_names() {
        assert_eq!("text".parse::<ModuleType>().unwrap(), ModuleType::Text);
        assert_eq!(
            "Context-Menu-User".parse::<ModuleType>().unwrap(),
            ModuleType::ContextMenuUser
        );
        assert_eq!(
            "slash".parse::<ModuleType>().unwrap_err(),
            UnknownModuleType("slash".into())
        );
    }
}
