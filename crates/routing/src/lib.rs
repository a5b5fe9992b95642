//! Module definitions and the registry that resolves event names to them.
//!
//! Each [`ModuleType`] occupies one or more [`Namespace`]s (`Both` sits in the
//! text and interactive ones). A payload kind maps to exactly one namespace
//! and a fixed set of accepted module types, see [`kind::accepted_types`].

pub mod error;
pub mod kind;
pub mod module;
pub mod registry;

pub use {
    error::{Error, Result},
    kind::{ModuleType, Namespace, UnknownModuleType, accepted_types, accepts},
    module::{
        Describe, FnHandler, Module, ModuleBuilder, ModuleDefinition, ModuleHandler,
        OptionDefinition, OptionKind, describe, handler_fn,
    },
    registry::{CommandManifestEntry, Registry, RegistryBuilder},
};
