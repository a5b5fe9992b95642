//! Fan-in of independent event sources onto one queue.
//!
//! Each [`EventSource`] runs in its own listener task and pushes normalized
//! payloads through a [`Feed`]. All feeds share one bounded channel that the
//! router drains from an [`Inbound`]. Events from different sources are
//! interleaved in arrival order with no further guarantee.

use std::sync::Arc;

use {
    async_trait::async_trait,
    tokio::{sync::mpsc, task::JoinSet},
    tracing::{debug, error, info},
};

use crate::{
    Error, Result,
    payload::{
        ComponentButton, ComponentSelect, ContextMenuMessage, ContextMenuUser, ExternalEvent,
        InteractionCommand, ModalSubmit, Payload, ScheduledTick, TextMessage,
    },
};

#[cfg(feature = "metrics")]
use herald_metrics::{counter, dispatch as dispatch_metrics, labels};

/// A producer of raw platform events (gateway connection, webhook server,
/// scheduler, stdin, ...).
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Run until the source is exhausted or the feed closes.
    async fn listen(self: Box<Self>, feed: Feed) -> anyhow::Result<()>;
}

/// Handle a source uses to push events into the shared queue.
#[derive(Clone)]
pub struct Feed {
    source: Arc<str>,
    tx: mpsc::Sender<Payload>,
}

impl Feed {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Push one payload, waiting for queue space.
    pub async fn push(&self, payload: Payload) -> Result<()> {
        debug!(source = %self.source, kind = %payload.kind(), "event queued");
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::EVENTS_TOTAL, labels::KIND => payload.kind().as_str())
            .increment(1);
        self.tx
            .send(payload)
            .await
            .map_err(|_| Error::feed_closed(&self.source))
    }

    /// True once the router has stopped consuming.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn on_text_message(&self, event: TextMessage) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_interaction_command(&self, event: InteractionCommand) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_component_button(&self, event: ComponentButton) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_component_select(&self, event: ComponentSelect) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_modal_submit(&self, event: ModalSubmit) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_context_menu_user(&self, event: ContextMenuUser) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_context_menu_message(&self, event: ContextMenuMessage) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_scheduled_tick(&self, event: ScheduledTick) -> Result<()> {
        self.push(event.into()).await
    }

    pub async fn on_external_event(&self, event: ExternalEvent) -> Result<()> {
        self.push(event.into()).await
    }
}

/// Boot-time builder that wires sources onto a single queue.
pub struct FanIn {
    tx: mpsc::Sender<Payload>,
    rx: mpsc::Receiver<Payload>,
    listeners: JoinSet<()>,
}

impl FanIn {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx,
            listeners: JoinSet::new(),
        }
    }

    /// A feed for code that pushes events directly instead of through a
    /// spawned [`EventSource`] (tests, embedding applications).
    pub fn feed(&self, source: &str) -> Feed {
        Feed {
            source: Arc::from(source),
            tx: self.tx.clone(),
        }
    }

    /// Spawn a listener task for `source`. Must be called inside a tokio runtime.
    pub fn spawn(&mut self, source: Box<dyn EventSource>) {
        let name = source.name().to_string();
        let feed = self.feed(&name);
        self.listeners.spawn(async move {
            info!(source = %name, "event source listening");
            match source.listen(feed).await {
                Ok(()) => info!(source = %name, "event source finished"),
                Err(e) => error!(source = %name, error = %e, "event source failed"),
            }
        });
    }

    /// Finish wiring. The queue closes once every feed handed out so far
    /// (including those held by spawned sources) has been dropped.
    pub fn finish(self) -> Inbound {
        drop(self.tx);
        Inbound {
            rx: self.rx,
            listeners: self.listeners,
        }
    }
}

/// Consumer side of the fan-in queue.
pub struct Inbound {
    rx: mpsc::Receiver<Payload>,
    listeners: JoinSet<()>,
}

impl Inbound {
    /// Next event, or `None` once every feed is gone.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.rx.recv().await
    }

    /// Stop accepting new events. Events already queued are still returned
    /// by [`Inbound::recv`], after which it yields `None`.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Stop accepting events and tear down listener tasks.
    pub async fn shutdown(mut self) {
        self.rx.close();
        self.listeners.abort_all();
        while self.listeners.join_next().await.is_some() {}
        debug!("event sources shut down");
    }
}
