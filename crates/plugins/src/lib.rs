//! Plugin control protocol for herald modules.
//!
//! A module carries an ordered list of [`Plugin`]s. Init plugins run once
//! while the module registers; control plugins run on every invocation
//! against a mutable [`Context`] and decide through a [`Signal`] whether the
//! module's `execute` may run.

pub mod args;
pub mod builtin;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod plugin;
pub mod signal;

pub use {
    args::Args,
    builtin::{AllowList, GuildOnly, RequireLocal, Subject},
    context::{Context, Dependencies},
    error::{Error, Result},
    plugin::{ControlPlugin, InitPlugin, Plugin, control_fn, init_fn},
    signal::{Outcome, Signal},
};
