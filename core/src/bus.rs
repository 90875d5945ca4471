//! Fan-out of completed-call events to independent subscribers.
//!
//! # Design
//! Each subscriber owns an unbounded tokio mpsc queue; the bus keeps the
//! sending halves and clones every published event into each of them. The
//! bus is owned by the `RestClient` instead of living in a process-wide
//! singleton. Publishing never blocks and never drops an event for a live
//! subscriber. With no subscribers the event is simply discarded, and
//! subscribers whose receiver was dropped are pruned on the next publish.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::event::Event;

/// Receiving end handed out by `EventBus::subscribe`.
pub type Subscription = mpsc::UnboundedReceiver<Event>;

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<Event>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every current subscriber.
    pub fn publish(&self, event: Event) {
        let mut subscribers = self.subscribers();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        tracing::trace!(delivered = subscribers.len(), "event published");
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<Event>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
