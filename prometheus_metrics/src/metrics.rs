use anyhow::Result;
use log::warn;
use prometheus::{
    histogram_opts, opts, Histogram, HistogramTimer, IntCounter, IntCounterVec, IntGauge, Registry,
};

#[derive(Debug)]
pub struct Metrics {
    // Finalization
    pub finalization_requests: IntCounter,
    pub finalization_completions: IntCounter,
    pub finalization_failures: IntCounter,
    pub finalization_supersessions: IntCounter,
    finalization_call_times: Histogram,

    // Engine caches
    cache_lookups: IntCounterVec,
    payload_id_cache_slots: IntGauge,

    // Event relay
    pub relay_dropped_events: IntCounter,

    // Sync status
    sync_healthy: IntGauge,
    sync_status_changes: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Finalization
            finalization_requests: IntCounter::new(
                "FINALIZATION_REQUESTS",
                "Number of finalization requests received",
            )?,

            finalization_completions: IntCounter::new(
                "FINALIZATION_COMPLETIONS",
                "Number of engine finalization calls that completed successfully",
            )?,

            finalization_failures: IntCounter::new(
                "FINALIZATION_FAILURES",
                "Number of engine finalization calls that returned an error",
            )?,

            finalization_supersessions: IntCounter::new(
                "FINALIZATION_SUPERSESSIONS",
                "Number of finalization requests dropped or cancelled by a newer request",
            )?,

            finalization_call_times: Histogram::with_opts(histogram_opts!(
                "FINALIZATION_CALL_TIMES",
                "Durations of engine finalization calls that ran to completion",
            ))?,

            // Engine caches
            cache_lookups: IntCounterVec::new(
                opts!("ENGINE_CACHE_LOOKUPS", "Engine cache lookups by cache and outcome"),
                &["cache", "outcome"],
            )?,

            payload_id_cache_slots: IntGauge::new(
                "PAYLOAD_ID_CACHE_SLOTS",
                "Number of slots with cached payload identifiers",
            )?,

            // Event relay
            relay_dropped_events: IntCounter::new(
                "RELAY_DROPPED_EVENTS",
                "Number of events dropped because a subscriber channel was full",
            )?,

            // Sync status
            sync_healthy: IntGauge::new(
                "SYNC_HEALTHY",
                "Whether both consensus and execution layers are synced",
            )?,

            sync_status_changes: IntCounterVec::new(
                opts!("SYNC_STATUS_CHANGES", "Published sync status updates"),
                &["synced"],
            )?,
        })
    }

    pub fn register_with_default_metrics(&self) -> Result<()> {
        self.register(prometheus::default_registry())
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.finalization_requests.clone()))?;
        registry.register(Box::new(self.finalization_completions.clone()))?;
        registry.register(Box::new(self.finalization_failures.clone()))?;
        registry.register(Box::new(self.finalization_supersessions.clone()))?;
        registry.register(Box::new(self.finalization_call_times.clone()))?;
        registry.register(Box::new(self.cache_lookups.clone()))?;
        registry.register(Box::new(self.payload_id_cache_slots.clone()))?;
        registry.register(Box::new(self.relay_dropped_events.clone()))?;
        registry.register(Box::new(self.sync_healthy.clone()))?;
        registry.register(Box::new(self.sync_status_changes.clone()))?;

        Ok(())
    }

    // Finalization
    #[must_use]
    pub fn start_finalization_call_timer(&self) -> HistogramTimer {
        self.finalization_call_times.start_timer()
    }

    // Engine caches
    pub fn register_cache_lookup(&self, cache: &str, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };

        match self
            .cache_lookups
            .get_metric_with_label_values(&[cache, outcome])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to register {cache} cache lookup: {error:?}"),
        }
    }

    pub fn set_payload_id_cache_slots(&self, slots: usize) {
        match i64::try_from(slots) {
            Ok(slots) => self.payload_id_cache_slots.set(slots),
            Err(error) => warn!("unable to set payload id cache slot count: {error:?}"),
        }
    }

    // Sync status
    pub fn set_sync_healthy(&self, healthy: bool) {
        self.sync_healthy.set(healthy.into());
    }

    pub fn register_sync_status_change(&self, synced: bool) {
        let label = if synced { "true" } else { "false" };

        match self
            .sync_status_changes
            .get_metric_with_label_values(&[label])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to register sync status change: {error:?}"),
        }
    }

    #[cfg(test)]
    fn cache_lookup_count(&self, cache: &str, outcome: &str) -> Result<u64> {
        Ok(self
            .cache_lookups
            .get_metric_with_label_values(&[cache, outcome])?
            .get())
    }
}
