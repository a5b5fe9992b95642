//! Per-dispatch failure isolation.
//!
//! Handler and plugin futures are polled inside `catch_unwind`, so a panic
//! becomes an error value for the one dispatch that caused it. Every error
//! that reaches [`recover`] is logged, published as
//! [`LifecycleEvent::DispatchFailed`], and answered with the configured
//! failure reply.

use std::{future::Future, panic::AssertUnwindSafe};

use {
    futures::FutureExt,
    herald_channels::{EventBus, LifecycleEvent},
    herald_common::Reply,
    herald_config::MessagesConfig,
    herald_plugins::pipeline::panic_message,
    tracing::{error, warn},
};

use crate::error::DispatchError;

#[cfg(feature = "metrics")]
use herald_metrics::{counter, dispatch as dispatch_metrics, labels};

/// Await `fut`, turning a panic into an `anyhow` error.
pub async fn catch<F, T>(fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow::anyhow!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

/// Log and publish a dispatch failure, returning the reply to send.
pub fn recover(error: &DispatchError, messages: &MessagesConfig, events: &EventBus) -> Reply {
    let module = error.module();
    let stage = error.stage();
    match error {
        DispatchError::PluginFailed { .. } => {
            warn!(module, stage, error = %error, "dispatch halted by failing plugin");
        },
        _ => {
            error!(module, stage, error = %error, "dispatch failed");
        },
    }
    #[cfg(feature = "metrics")]
    counter!(dispatch_metrics::FAILURES_TOTAL, labels::STAGE => stage).increment(1);

    events.publish(LifecycleEvent::DispatchFailed {
        name: module.map(str::to_string),
        stage: stage.to_string(),
        error: error.to_string(),
    });
    Reply::text(messages.failure.clone()).ephemeral()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn catch_passes_through_results() {
        assert_eq!(catch(async { Ok(7) }).await.unwrap(), 7);
        let err = catch(async { Err::<(), _>(anyhow::anyhow!("nope")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn catch_converts_panics() {
        let err = catch(async {
            if true {
                panic!("handler exploded");
            }
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("handler exploded"));
    }

    #[tokio::test]
    async fn recover_publishes_and_replies() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let messages = MessagesConfig::default();
        let error = DispatchError::threw("crash", "execute", anyhow::anyhow!("boom"));

        let reply = recover(&error, &messages, &bus);
        assert_eq!(reply.text, messages.failure);
        assert!(reply.ephemeral);

        match rx.recv().await.unwrap() {
            LifecycleEvent::DispatchFailed { name, stage, error } => {
                assert_eq!(name.as_deref(), Some("crash"));
                assert_eq!(stage, "execute");
                assert!(error.contains("boom"));
            },
            other => panic!("unexpected event {other:?}"),
        }
    }
}
