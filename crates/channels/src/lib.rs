//! Inbound event model and the edges of the dispatch path.
//!
//! Platform adapters implement [`EventSource`] to push normalized
//! [`Payload`]s into a shared [`FanIn`] queue, and [`ReplySink`] to deliver
//! whatever the router decides to answer.

pub mod error;
pub mod events;
pub mod gating;
pub mod payload;
pub mod sink;
pub mod source;

pub use {
    error::{Error, Result},
    events::{EventBus, LifecycleEvent},
    payload::{
        CommandOption, ComponentButton, ComponentSelect, ContextMenuMessage, ContextMenuUser,
        Envelope, ExternalEvent, InteractionCommand, InteractionMeta, ModalSubmit, OptionValue,
        Payload, PayloadKind, RawInput, ScheduledTick, TextMessage,
    },
    sink::{NullSink, ReplySink},
    source::{EventSource, FanIn, Feed, Inbound},
};
