use {async_trait::async_trait, herald_common::Reply, tracing::debug};

use crate::payload::Payload;

/// Delivers replies back to wherever the originating event came from.
///
/// The router calls [`ReplySink::send`] at most once per dispatch. Platform
/// adapters decide how to address the reply from the origin payload (reply in
/// channel, respond to the interaction, log for scheduled ticks, ...).
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, origin: &Payload, reply: Reply) -> anyhow::Result<()>;
}

/// Sink that drops every reply. Useful for headless deployments that only
/// handle scheduled and external events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl ReplySink for NullSink {
    async fn send(&self, origin: &Payload, reply: Reply) -> anyhow::Result<()> {
        debug!(kind = %origin.kind(), text = %reply.text, "reply dropped by null sink");
        Ok(())
    }
}
