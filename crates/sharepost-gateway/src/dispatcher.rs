use std::sync::Arc;

use tokio::sync::broadcast;

use sharepost_types::events::PlatformEvent;

/// Fans platform events out to every connected gateway client.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// All connections receive all events and filter targeted ones themselves
    broadcast_tx: broadcast::Sender<PlatformEvent>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Events published with no subscribers are dropped.
    pub fn broadcast(&self, event: PlatformEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }
}
