//! Lifecycle notifications (pub/sub).

use std::time::Duration;

use {serde::Serialize, tokio::sync::broadcast, tracing::trace};

/// Events published while modules load and events are dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The registry was frozen and serving can begin.
    ModulesLoaded { count: usize, elapsed: Duration },
    ModuleRegistered { name: String, kind: String },
    /// An init plugin stopped the module or its declared type was invalid.
    ModuleRejected { name: String, reason: String },
    /// A module passed its control plugins and is about to execute.
    ModuleActivated { name: String, kind: String },
    DispatchFailed {
        name: Option<String>,
        stage: String,
        error: String,
    },
}

/// Broadcast bus for [`LifecycleEvent`]s. Publishing never blocks and never
/// fails; events published with no subscriber are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LifecycleEvent) {
        if self.sender.send(event).is_err() {
            trace!("lifecycle event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
