//! Plugin traits.
//!
//! Init plugins run once while a module registers and may rewrite the module
//! (`M` is the module type of the registry using them). Control plugins run on
//! every invocation and gate `execute`.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{context::Context, signal::Signal};

/// Runs once per module, at registration time.
#[async_trait]
pub trait InitPlugin<M>: Send + Sync {
    fn name(&self) -> &str;

    /// Return [`Signal::Stop`] (or `StopWith`, whose text becomes the
    /// rejection reason) to keep the module out of the registry.
    async fn init(&self, module: &mut M) -> anyhow::Result<Signal>;
}

/// Runs once per invocation, before `execute`.
#[async_trait]
pub trait ControlPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &mut Context) -> anyhow::Result<Signal>;
}

/// A module's plugin list entry.
pub enum Plugin<M> {
    Init(Arc<dyn InitPlugin<M>>),
    Control(Arc<dyn ControlPlugin>),
}

impl<M> Plugin<M> {
    pub fn init(plugin: impl InitPlugin<M> + 'static) -> Self {
        Self::Init(Arc::new(plugin))
    }

    pub fn control(plugin: impl ControlPlugin + 'static) -> Self {
        Self::Control(Arc::new(plugin))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Init(p) => p.name(),
            Self::Control(p) => p.name(),
        }
    }

    pub fn as_init(&self) -> Option<&Arc<dyn InitPlugin<M>>> {
        match self {
            Self::Init(p) => Some(p),
            Self::Control(_) => None,
        }
    }

    pub fn as_control(&self) -> Option<&Arc<dyn ControlPlugin>> {
        match self {
            Self::Control(p) => Some(p),
            Self::Init(_) => None,
        }
    }
}

impl<M> Clone for Plugin<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Init(p) => Self::Init(Arc::clone(p)),
            Self::Control(p) => Self::Control(Arc::clone(p)),
        }
    }
}

impl<M> fmt::Debug for Plugin<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(p) => f.debug_tuple("Init").field(&p.name()).finish(),
            Self::Control(p) => f.debug_tuple("Control").field(&p.name()).finish(),
        }
    }
}

// ── Closure adapters ────────────────────────────────────────────────────────

/// Control plugin backed by a synchronous function.
pub struct ControlFn<F> {
    name: String,
    f: F,
}

/// Wrap `f` as a control plugin named `name`.
pub fn control_fn<F>(name: impl Into<String>, f: F) -> ControlFn<F>
where
    F: Fn(&mut Context) -> anyhow::Result<Signal> + Send + Sync,
{
    ControlFn {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F> ControlPlugin for ControlFn<F>
where
    F: Fn(&mut Context) -> anyhow::Result<Signal> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, ctx: &mut Context) -> anyhow::Result<Signal> {
        (self.f)(ctx)
    }
}

/// Init plugin backed by a synchronous function.
pub struct InitFn<F> {
    name: String,
    f: F,
}

/// Wrap `f` as an init plugin named `name`.
pub fn init_fn<M, F>(name: impl Into<String>, f: F) -> InitFn<F>
where
    F: Fn(&mut M) -> anyhow::Result<Signal> + Send + Sync,
{
    InitFn {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<M, F> InitPlugin<M> for InitFn<F>
where
    M: Send,
    F: Fn(&mut M) -> anyhow::Result<Signal> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, module: &mut M) -> anyhow::Result<Signal> {
        (self.f)(module)
    }
}
