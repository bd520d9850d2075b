use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use prometheus_metrics::Metrics;
use types::primitives::{ExecutionBlockHash, PayloadId, Slot};

/// Number of slots before the most recently set one that are kept by [`PayloadIdCache::set`].
pub const PAYLOAD_ID_CACHE_WINDOW: Slot = 2;

/// Payload identifiers returned by `engine_forkchoiceUpdated`, keyed by slot and parent hash.
///
/// Entries are bucketed by slot, so lookups and insertions for different slots do not contend
/// with each other and pruning only has to walk the slots.
#[derive(Default)]
pub struct PayloadIdCache {
    slots: DashMap<Slot, HashMap<ExecutionBlockHash, PayloadId>>,
    metrics: Option<Arc<Metrics>>,
}

impl PayloadIdCache {
    #[must_use]
    pub fn new(metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            slots: DashMap::new(),
            metrics,
        }
    }

    #[must_use]
    pub fn get(&self, slot: Slot, parent_hash: ExecutionBlockHash) -> Option<PayloadId> {
        let payload_id = self
            .slots
            .get(&slot)
            .and_then(|payload_ids| payload_ids.get(&parent_hash).copied());

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.register_cache_lookup("payload_id", payload_id.is_some());
        }

        features::log!(
            DebugEngineCache,
            "payload id lookup (slot: {slot}, parent_hash: {parent_hash:?}, result: {payload_id:?})",
        );

        payload_id
    }

    /// Stores `payload_id` and drops every slot more than [`PAYLOAD_ID_CACHE_WINDOW`] slots older
    /// than `slot`.
    pub fn set(&self, slot: Slot, parent_hash: ExecutionBlockHash, payload_id: PayloadId) {
        self.slots
            .entry(slot)
            .or_default()
            .insert(parent_hash, payload_id);

        self.prune(slot.saturating_sub(PAYLOAD_ID_CACHE_WINDOW));
    }

    /// Drops all entries for slots below `slot_threshold`.
    pub fn prune(&self, slot_threshold: Slot) {
        self.slots.retain(|slot, _| *slot >= slot_threshold);

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.set_payload_id_cache_slots(self.slots.len());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().map(|payload_ids| payload_ids.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
