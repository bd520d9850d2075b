use derive_more::Constructor;
use strum::{AsRefStr, Display, EnumString};

/// Kinds of events exchanged between node services.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    /// Raw consensus layer sync signal from a poller.
    ClSyncStatus,
    /// Raw execution layer sync signal from a poller.
    ElSyncStatus,
    /// Whether the execution engine is reachable at all.
    ElConnection,
    /// Debounced node sync status.
    SyncStatusUpdate,
    FinalizedBlock,
    NewSlot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Constructor)]
pub struct Event<T> {
    pub topic: Topic,
    pub data: T,
}

impl<T> Event<T> {
    pub const fn data(&self) -> &T {
        &self.data
    }

    pub fn is(&self, topic: Topic) -> bool {
        self.topic == topic
    }
}
