//! Fan-out of values to independently paced subscribers.
//!
//! Every subscriber owns a bounded channel. [`EventRelay::notify`] and [`EventRelay::broadcast`]
//! never block and drop the value for subscribers whose channel is full.
//! [`EventRelay::notify_with_cancellation`] waits for room in every channel instead and gives up
//! on all remaining subscribers once its token is cancelled.

pub use crate::relay::{EventRelay, Subscriber, SubscriberId, DEFAULT_SUBSCRIBER_CAPACITY};

mod relay;
