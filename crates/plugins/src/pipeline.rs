//! Sequential plugin execution.
//!
//! Plugins run strictly in list order and each one is awaited before the next
//! starts. The first `Stop`/`StopWith` ends the chain. An error or a panic
//! inside a plugin is caught here and surfaces as [`Outcome::Failed`].

use std::{panic::AssertUnwindSafe, sync::Arc, time::Instant};

use {
    futures::FutureExt,
    tracing::{debug, info, warn},
};

use crate::{
    context::Context,
    plugin::{ControlPlugin, InitPlugin},
    signal::{Outcome, Signal},
};

#[cfg(feature = "metrics")]
use herald_metrics::{counter, histogram, labels, plugins as plugin_metrics};

/// Run control plugins against one invocation.
pub async fn run(plugins: &[Arc<dyn ControlPlugin>], ctx: &mut Context) -> Outcome {
    if plugins.is_empty() {
        return Outcome::Proceed;
    }
    debug!(module = %ctx.module(), dispatch = %ctx.id(), count = plugins.len(), "running control plugins");

    for plugin in plugins {
        let name = plugin.name();
        let start = Instant::now();
        let result = AssertUnwindSafe(plugin.check(ctx)).catch_unwind().await;
        let latency = start.elapsed();
        debug!(plugin = name, module = %ctx.module(), latency_ms = latency.as_millis() as u64, "control plugin finished");
        record(name, "control", latency.as_secs_f64());

        match settle(name, result) {
            Ok(Signal::Next) => {},
            Ok(Signal::Stop) => {
                info!(plugin = name, module = %ctx.module(), "control plugin stopped dispatch");
                return Outcome::Halted {
                    plugin: name.to_string(),
                    reply: None,
                };
            },
            Ok(Signal::StopWith(reply)) => {
                info!(plugin = name, module = %ctx.module(), reply = %reply.text, "control plugin stopped dispatch with reply");
                return Outcome::Halted {
                    plugin: name.to_string(),
                    reply: Some(reply),
                };
            },
            Err(error) => {
                warn!(plugin = name, module = %ctx.module(), error = %error, "control plugin failed");
                record_failure(name, "control");
                return Outcome::Failed {
                    plugin: name.to_string(),
                    error,
                };
            },
        }
    }

    Outcome::Proceed
}

/// Run init plugins against a module that is being registered.
pub async fn run_init<M: Send>(plugins: &[Arc<dyn InitPlugin<M>>], module: &mut M) -> Outcome {
    for plugin in plugins {
        let name = plugin.name();
        let start = Instant::now();
        let result = AssertUnwindSafe(plugin.init(module)).catch_unwind().await;
        let latency = start.elapsed();
        debug!(plugin = name, latency_ms = latency.as_millis() as u64, "init plugin finished");
        record(name, "init", latency.as_secs_f64());

        match settle(name, result) {
            Ok(Signal::Next) => {},
            Ok(Signal::Stop) => {
                return Outcome::Halted {
                    plugin: name.to_string(),
                    reply: None,
                };
            },
            Ok(Signal::StopWith(reply)) => {
                return Outcome::Halted {
                    plugin: name.to_string(),
                    reply: Some(reply),
                };
            },
            Err(error) => {
                record_failure(name, "init");
                return Outcome::Failed {
                    plugin: name.to_string(),
                    error,
                };
            },
        }
    }

    Outcome::Proceed
}

/// Flatten a caught plugin result into `anyhow`.
fn settle(
    plugin: &str,
    result: std::thread::Result<anyhow::Result<Signal>>,
) -> anyhow::Result<Signal> {
    match result {
        Ok(inner) => inner,
        Err(panic) => Err(anyhow::anyhow!(
            "plugin `{plugin}` panicked: {}",
            panic_message(panic.as_ref())
        )),
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(feature = "metrics")]
fn record(plugin: &str, stage: &'static str, seconds: f64) {
    counter!(plugin_metrics::CALLS_TOTAL, labels::PLUGIN => plugin.to_string(), labels::STAGE => stage)
        .increment(1);
    histogram!(plugin_metrics::DURATION_SECONDS, labels::PLUGIN => plugin.to_string(), labels::STAGE => stage)
        .record(seconds);
}

#[cfg(not(feature = "metrics"))]
fn record(_plugin: &str, _stage: &'static str, _seconds: f64) {}

#[cfg(feature = "metrics")]
fn record_failure(plugin: &str, stage: &'static str) {
    counter!(plugin_metrics::FAILURES_TOTAL, labels::PLUGIN => plugin.to_string(), labels::STAGE => stage)
        .increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_failure(_plugin: &str, _stage: &'static str) {}
