//! Same-document message bus.
//!
//! Broadcast semantics: every subscriber sees every message, whatever its
//! type or origin. Receivers filter on their side.

use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Envelope, RelayMessage, WindowId};

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 64;

/// Message bus of one document. Clones share the same channel and window id.
#[derive(Clone, Debug)]
pub struct MessageBus {
    window: WindowId,
    sender: broadcast::Sender<Envelope>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            window: Uuid::new_v4(),
            sender,
        }
    }

    /// Id of the document that owns this bus.
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Post a message from this document.
    pub fn post(&self, message: RelayMessage) {
        self.post_from(self.window, message);
    }

    /// Post a message stamped with another origin, as a frame sharing the
    /// document's listeners would.
    pub fn post_from(&self, origin: WindowId, message: RelayMessage) {
        let kind = message.as_str();
        match self.sender.send(Envelope { origin, message }) {
            Ok(receivers) => debug!(kind, receivers, "Posted message"),
            // No listeners yet; the message is dropped like an unobserved postMessage
            Err(_) => debug!(kind, "Posted message (no listeners)"),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }
}

/// A listener on the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<Envelope>,
}

impl Subscription {
    /// Next message on the bus, or `None` once every sender is gone.
    ///
    /// A listener that falls behind skips the overwritten messages and keeps going.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Bus listener lagged, skipped messages");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
