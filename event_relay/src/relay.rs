use core::{
    mem,
    sync::atomic::{AtomicU64, Ordering},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

use log::debug;
use parking_lot::RwLock;
use prometheus_metrics::Metrics;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 16;

pub type SubscriberId = u64;

struct Shared<T> {
    next_id: AtomicU64,
    senders: RwLock<BTreeMap<SubscriberId, Sender<T>>>,
    metrics: Option<Arc<Metrics>>,
}

pub struct EventRelay<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for EventRelay<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send> Default for EventRelay<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T: Clone + Send> EventRelay<T> {
    #[must_use]
    pub fn new(metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                next_id: AtomicU64::new(0),
                senders: RwLock::default(),
                metrics,
            }),
        }
    }

    /// Registers a new subscriber with a channel holding up to `capacity` values.
    ///
    /// A capacity of 0 is treated as 1.
    #[must_use]
    pub fn add_subscriber(&self, capacity: usize) -> Subscriber<T> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);

        self.shared.senders.write().insert(id, sender);

        Subscriber {
            id,
            receiver,
            relay: Arc::downgrade(&self.shared),
            closed: false,
        }
    }

    pub fn notify(&self, value: T) {
        let senders = self.shared.senders.read();

        for (id, sender) in senders.iter() {
            match sender.try_send(value.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    features::log!(LogRelayDrops, "dropping value for subscriber {id}: channel full");

                    if let Some(metrics) = self.shared.metrics.as_ref() {
                        metrics.relay_dropped_events.inc();
                    }
                }
                // The subscriber is closing and will deregister itself.
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Same as [`Self::notify`].
    pub fn broadcast(&self, value: T) {
        self.notify(value)
    }

    /// Delivers `value` to every subscriber in registration order, waiting for room in full
    /// channels.
    ///
    /// Cancelling `token` abandons the delivery in progress and every delivery after it.
    /// Returns the number of subscribers that received the value.
    pub async fn notify_with_cancellation(&self, token: &CancellationToken, value: T) -> usize {
        let senders = self
            .shared
            .senders
            .read()
            .values()
            .cloned()
            .collect::<Vec<_>>();

        let mut delivered = 0;

        for sender in senders {
            tokio::select! {
                biased;

                () = token.cancelled() => {
                    debug!("fan-out cancelled after {delivered} deliveries");
                    break;
                }

                result = sender.send(value.clone()) => {
                    if result.is_ok() {
                        delivered += 1;
                    }
                }
            }
        }

        delivered
    }

    /// Closes the channels of all subscribers and forgets them.
    ///
    /// Values already buffered can still be received.
    pub fn close(&self) {
        let senders = mem::take(&mut *self.shared.senders.write());

        debug!("closing event relay with {} subscribers", senders.len());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.senders.read().len()
    }
}

pub struct Subscriber<T> {
    id: SubscriberId,
    receiver: Receiver<T>,
    relay: Weak<Shared<T>>,
    closed: bool,
}

impl<T> Subscriber<T> {
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed || self.receiver.is_closed()
    }

    /// Deregisters from the relay and closes the channel. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        if mem::replace(&mut self.closed, true) {
            return;
        }

        if let Some(shared) = self.relay.upgrade() {
            shared.senders.write().remove(&self.id);
        }

        self.receiver.close();
    }
}

impl<T> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.close();
    }
}
