//! Event fan-out.
//!
//! A single broker sits between the machine registry and the `/events`
//! subscribers. Delivery is best-effort per subscriber: each subscription
//! owns a small bounded queue, and a consumer that falls behind loses events
//! rather than exerting backpressure on the DHCP/TFTP/HTTP paths. The
//! authoritative history lives in each machine's event ring and can be
//! re-fetched on reconnect.

use damselfly_common::IdentifiedEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Queue depth per subscriber; small to avoid head-of-line blocking.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 8;

type SubscriberMap = RwLock<HashMap<u64, mpsc::Sender<IdentifiedEvent>>>;

#[derive(Default)]
pub struct Broker {
    next_id: AtomicU64,
    subscribers: Arc<SubscriberMap>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Events published after this call are delivered
    /// until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self) -> (mpsc::Receiver<IdentifiedEvent>, Subscription) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().unwrap().insert(id, tx);
        (
            rx,
            Subscription {
                subscribers: Arc::clone(&self.subscribers),
                id,
            },
        )
    }

    /// Fan `event` out to every current subscriber without ever blocking:
    /// a full (or already closed) queue drops the event for that subscriber
    /// only.
    pub fn publish(&self, event: IdentifiedEvent) {
        let subscribers = self.subscribers.read().unwrap();
        for tx in subscribers.values() {
            let _ = tx.try_send(event.clone());
        }
    }

    /// Subscribers currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }
}

/// A live subscription. Dropping it (or calling [`Subscription::unsubscribe`])
/// deregisters the subscriber and closes its channel; the paired receiver
/// then drains whatever was queued and ends.
pub struct Subscription {
    subscribers: Arc<SubscriberMap>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscribers.write().unwrap().remove(&self.id);
    }
}
