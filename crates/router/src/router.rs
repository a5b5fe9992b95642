//! The dispatch loop.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use {
    herald_channels::{Inbound, LifecycleEvent, Payload, PayloadKind},
    herald_common::Reply,
    herald_config::{MessagesConfig, RouterConfig},
    herald_plugins::{Context, Dependencies, Outcome, pipeline},
    herald_routing::{Module, ModuleType, Registry},
    tokio::task::JoinSet,
    tokio_util::sync::CancellationToken,
    tracing::{Instrument, debug, info, info_span, warn},
};

use crate::{
    boundary,
    classify::{Classified, IgnoreReason, classify},
    error::DispatchError,
};

#[cfg(feature = "metrics")]
use herald_metrics::{counter, dispatch as dispatch_metrics, gauge, histogram, labels};

/// What happened to one event.
#[derive(Debug)]
pub enum Status {
    /// Dropped during classification; nothing was sent.
    Ignored(IgnoreReason),
    /// `execute` ran to completion.
    Executed,
    /// A control plugin stopped the dispatch.
    Halted { plugin: String },
    /// Handled locally with a default reply (unknown command, rejected
    /// arguments).
    Recovered(DispatchError),
    /// Caught by the error boundary and answered with the failure reply.
    Failed(DispatchError),
}

/// Report of one dispatch.
#[derive(Debug)]
pub struct Dispatch {
    pub kind: PayloadKind,
    pub module: Option<String>,
    pub status: Status,
    /// The reply handed to the reply sink, if any.
    pub reply: Option<Reply>,
    pub elapsed: Duration,
}

/// Routes events to modules. Cheap to clone; clones share the registry and
/// dependencies.
#[derive(Clone)]
pub struct Router {
    registry: Arc<Registry>,
    deps: Arc<Dependencies>,
    config: Arc<RouterConfig>,
    messages: Arc<MessagesConfig>,
}

impl Router {
    pub fn new(
        registry: Arc<Registry>,
        deps: Arc<Dependencies>,
        config: RouterConfig,
        messages: MessagesConfig,
    ) -> Self {
        Self {
            registry,
            deps,
            config: Arc::new(config),
            messages: Arc::new(messages),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn deps(&self) -> &Arc<Dependencies> {
        &self.deps
    }

    /// Consume `inbound` until every source is gone or `shutdown` fires.
    /// On shutdown the queue stops accepting events and whatever was already
    /// queued is still dispatched.
    ///
    /// Each event is dispatched on its own task, so events carry no ordering
    /// guarantee relative to each other and a slow or failing handler never
    /// blocks the loop. In-flight dispatches are awaited before returning.
    pub async fn serve(&self, mut inbound: Inbound, shutdown: CancellationToken) {
        info!(modules = self.registry.len(), prefix = %self.config.prefix, "router serving");
        let mut in_flight = JoinSet::new();
        let mut draining = false;

        loop {
            let payload = tokio::select! {
                _ = shutdown.cancelled(), if !draining => {
                    info!("router shutdown requested, draining queued events");
                    inbound.close();
                    draining = true;
                    continue;
                },
                payload = inbound.recv() => payload,
            };
            let Some(payload) = payload else {
                if !draining {
                    info!("all event sources closed");
                }
                break;
            };

            let router = self.clone();
            #[cfg(feature = "metrics")]
            gauge!(dispatch_metrics::IN_FLIGHT).increment(1.0);
            in_flight.spawn(async move {
                router.dispatch(payload).await;
                #[cfg(feature = "metrics")]
                gauge!(dispatch_metrics::IN_FLIGHT).decrement(1.0);
            });

            // Reap finished tasks so the set does not grow unbounded.
            while let Some(joined) = in_flight.try_join_next() {
                log_join(joined);
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        inbound.shutdown().await;
        info!("router stopped");
    }

    /// Run one event through classification, lookup, plugins and `execute`.
    /// Never fails: every error is answered through the reply sink.
    pub async fn dispatch(&self, payload: Payload) -> Dispatch {
        let started = Instant::now();
        let kind = payload.kind();
        let span = info_span!("dispatch", kind = %kind, source = %payload.source_id());
        let (module, status, reply) = self.dispatch_inner(payload).instrument(span).await;
        let elapsed = started.elapsed();

        #[cfg(feature = "metrics")]
        histogram!(dispatch_metrics::DURATION_SECONDS, labels::KIND => kind.as_str())
            .record(elapsed.as_secs_f64());

        Dispatch {
            kind,
            module,
            status,
            reply,
            elapsed,
        }
    }

    async fn dispatch_inner(&self, payload: Payload) -> (Option<String>, Status, Option<Reply>) {
        let kind = payload.kind();
        let (name, args) = match classify(&payload, &self.config) {
            Classified::Command { name, args } => (name, args),
            Classified::Ignored(reason) => {
                debug!(reason = reason.as_str(), "event ignored");
                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::IGNORED_TOTAL, labels::KIND => kind.as_str())
                    .increment(1);
                return (None, Status::Ignored(reason), None);
            },
        };

        let Some(module) = self.registry.resolve(&name, kind) else {
            let reply = self.not_found_reply(&name, kind);
            let error = DispatchError::not_found(&name, kind);
            debug!(error = %error, "module not found");
            #[cfg(feature = "metrics")]
            counter!(dispatch_metrics::NOT_FOUND_TOTAL, labels::KIND => kind.as_str()).increment(1);
            self.deliver(&payload, &reply).await;
            return (None, Status::Recovered(error), Some(reply));
        };

        let mut ctx = Context::with_args(module.name.clone(), payload, args, Arc::clone(&self.deps));
        let (status, reply) = match self.run_module(&module, &mut ctx).await {
            Ok(step) => step,
            Err(error) => {
                let reply = boundary::recover(&error, &self.messages, &self.deps.events);
                (Status::Failed(error), Some(reply))
            },
        };

        if let Some(reply) = &reply {
            self.deliver(ctx.payload(), reply).await;
        }
        (Some(module.name.clone()), status, reply)
    }

    /// Steps after lookup: parse, control plugins, execute.
    async fn run_module(
        &self,
        module: &Module,
        ctx: &mut Context,
    ) -> crate::Result<(Status, Option<Reply>)> {
        let raw = ctx.take_args();
        let parsed = boundary::catch(async {
            Ok(module.handler.parse(ctx, raw).await)
        })
        .await
        .map_err(|e| DispatchError::threw(&module.name, "parse", e))?;
        let args = match parsed {
            Ok(args) => args,
            Err(reply) => {
                debug!(module = %module.name, reply = %reply.text, "arguments rejected");
                let error = DispatchError::ArgumentParseFailure {
                    module: module.name.clone(),
                };
                return Ok((Status::Recovered(error), Some(reply)));
            },
        };
        ctx.set_args(args);

        match pipeline::run(&module.control_plugins(), ctx).await {
            Outcome::Proceed => {},
            Outcome::Halted { plugin, reply } => {
                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::HALTED_TOTAL, labels::MODULE => module.name.clone())
                    .increment(1);
                return Ok((Status::Halted { plugin }, reply));
            },
            Outcome::Failed { plugin, error } => {
                return Err(DispatchError::plugin_failed(&module.name, plugin, error));
            },
        }

        self.deps.events.publish(LifecycleEvent::ModuleActivated {
            name: module.name.clone(),
            kind: module.kind.to_string(),
        });
        debug!(module = %module.name, dispatch = %ctx.id(), "executing module");

        let args = ctx.args().clone();
        let reply = boundary::catch(module.handler.execute(ctx, args))
            .await
            .map_err(|e| DispatchError::threw(&module.name, "execute", e))?;
        Ok((Status::Executed, reply))
    }

    fn not_found_reply(&self, name: &str, kind: PayloadKind) -> Reply {
        let slash_only = kind == PayloadKind::TextMessage
            && self
                .registry
                .kinds_named(name)
                .iter()
                .any(ModuleType::is_command);
        let text = if slash_only {
            &self.messages.wrong_kind
        } else {
            &self.messages.unknown_command
        };
        Reply::text(text.clone())
    }

    /// Hand `reply` to the sink. Delivery failures are logged and swallowed.
    async fn deliver(&self, origin: &Payload, reply: &Reply) {
        if let Err(e) = self.deps.reply.send(origin, reply.clone()).await {
            warn!(kind = %origin.kind(), error = %e, "failed to deliver reply");
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined
        && e.is_panic()
    {
        warn!(error = %e, "dispatch task panicked");
    }
}
