use std::sync::Arc;

use event_relay::{EventRelay, Subscriber};
use log::{debug, info, warn};
use parking_lot::RwLock;
use prometheus_metrics::Metrics;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use types::events::{Event, Topic};

use crate::status::{ClStatus, ElStatus, SyncStatus};

pub const DEFAULT_SYNC_THRESHOLD: u64 = 5;

#[derive(Clone, Copy, Debug)]
pub struct SyncMonitorConfig {
    /// Number of consecutive positive consensus layer signals needed to consider it synced.
    pub threshold: u64,
}

impl Default for SyncMonitorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SYNC_THRESHOLD,
        }
    }
}

/// Turns raw sync signals from pollers into a debounced node sync status.
///
/// Consensus layer status only becomes synced after `threshold` consecutive positive signals.
/// A single negative signal resets it. Every negative consensus layer signal is republished as
/// a [`Topic::SyncStatusUpdate`] event, while a positive one is published only on the transition.
#[derive(Clone)]
pub struct SyncStatusMonitor {
    config: SyncMonitorConfig,
    status: Arc<RwLock<SyncStatus>>,
    relay: EventRelay<Event<bool>>,
    metrics: Option<Arc<Metrics>>,
}

impl Default for SyncStatusMonitor {
    fn default() -> Self {
        Self::new(SyncMonitorConfig::default(), None)
    }
}

impl SyncStatusMonitor {
    #[must_use]
    pub fn new(config: SyncMonitorConfig, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            config,
            status: Arc::default(),
            relay: EventRelay::new(metrics.clone()),
            metrics,
        }
    }

    /// Spawns the task processing events from `subscriber`.
    ///
    /// The task stops and closes `subscriber` when `token` is cancelled or the relay feeding
    /// `subscriber` is closed.
    pub fn start(
        &self,
        subscriber: Subscriber<Event<bool>>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(subscriber, token))
    }

    #[must_use]
    pub fn healthy(&self) -> bool {
        self.status().is_healthy()
    }

    #[must_use]
    pub fn cl_status(&self) -> ClStatus {
        self.status.read().cl_status
    }

    #[must_use]
    pub fn el_status(&self) -> ElStatus {
        self.status.read().el_status
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.status.read()
    }

    #[must_use]
    pub fn subscribe(&self, capacity: usize) -> Subscriber<Event<bool>> {
        self.relay.add_subscriber(capacity)
    }

    #[must_use]
    pub const fn relay(&self) -> &EventRelay<Event<bool>> {
        &self.relay
    }

    async fn run(self, mut subscriber: Subscriber<Event<bool>>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                () = token.cancelled() => {
                    debug!("sync status monitor cancelled");
                    break;
                }

                event = subscriber.recv() => {
                    let Some(event) = event else {
                        debug!("sync signal relay closed, stopping sync status monitor");
                        break;
                    };

                    self.process_event(event);
                }
            }
        }

        subscriber.close();
    }

    fn process_event(&self, event: Event<bool>) {
        let Event { topic, data } = event;

        let (update, status) = {
            let mut status = self.status.write();

            let update = match topic {
                Topic::ClSyncStatus => self.process_cl_sync_status(&mut status, data),
                Topic::ElSyncStatus => {
                    status.el_status = if data {
                        ElStatus::Synced
                    } else {
                        ElStatus::NotSynced
                    };

                    None
                }
                Topic::ElConnection => {
                    if !data {
                        status.el_status = ElStatus::Disconnected;
                    } else if status.el_status == ElStatus::Disconnected {
                        status.el_status = ElStatus::NotSynced;
                    }

                    None
                }
                Topic::SyncStatusUpdate | Topic::FinalizedBlock | Topic::NewSlot => {
                    warn!("sync status monitor received unexpected event (topic: {topic}, data: {data})");
                    return;
                }
            };

            (update, *status)
        };

        features::log!(
            DebugSyncStatus,
            "processed {topic} event (data: {data}, status: {status:?})",
        );

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.set_sync_healthy(status.is_healthy());
        }

        if let Some(synced) = update {
            if let Some(metrics) = self.metrics.as_ref() {
                metrics.register_sync_status_change(synced);
            }

            self.relay.notify(Event::new(Topic::SyncStatusUpdate, synced));
        }
    }

    fn process_cl_sync_status(&self, status: &mut SyncStatus, synced: bool) -> Option<bool> {
        if !synced {
            if status.cl_status == ClStatus::Synced {
                info!("consensus layer is no longer synced");
            }

            status.cl_status = ClStatus::NotSynced;
            status.cl_synced_signals = 0;

            return Some(false);
        }

        if status.cl_status == ClStatus::Synced {
            return None;
        }

        status.cl_synced_signals = status.cl_synced_signals.saturating_add(1);

        if status.cl_synced_signals < self.config.threshold {
            return None;
        }

        info!(
            "consensus layer is synced after {} consecutive signals",
            status.cl_synced_signals,
        );

        status.cl_status = ClStatus::Synced;

        Some(true)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use event_relay::DEFAULT_SUBSCRIBER_CAPACITY;
    use log::Level;
    use test_case::test_case;

    use super::*;

    const CL_SYNCED: Event<bool> = Event {
        topic: Topic::ClSyncStatus,
        data: true,
    };

    const CL_NOT_SYNCED: Event<bool> = Event {
        topic: Topic::ClSyncStatus,
        data: false,
    };

    fn drain(subscriber: &mut Subscriber<Event<bool>>) -> Vec<bool> {
        core::iter::from_fn(|| subscriber.try_recv())
            .map(|event| {
                assert!(event.is(Topic::SyncStatusUpdate));
                event.data
            })
            .collect()
    }

    #[test]
    fn consensus_layer_needs_threshold_consecutive_signals() {
        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);

        for _ in 1..DEFAULT_SYNC_THRESHOLD {
            monitor.process_event(CL_SYNCED);
        }

        assert_eq!(monitor.cl_status(), ClStatus::NotSynced);
        assert!(drain(&mut updates).is_empty());

        monitor.process_event(CL_SYNCED);

        assert_eq!(monitor.cl_status(), ClStatus::Synced);
        assert_eq!(drain(&mut updates), [true]);

        monitor.process_event(CL_SYNCED);

        assert_eq!(monitor.cl_status(), ClStatus::Synced);
        assert!(drain(&mut updates).is_empty());
    }

    #[test]
    fn negative_signal_resets_the_count() {
        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);

        for _ in 1..DEFAULT_SYNC_THRESHOLD {
            monitor.process_event(CL_SYNCED);
        }

        monitor.process_event(CL_NOT_SYNCED);

        for _ in 1..DEFAULT_SYNC_THRESHOLD {
            monitor.process_event(CL_SYNCED);
        }

        assert_eq!(monitor.cl_status(), ClStatus::NotSynced);
        assert_eq!(monitor.status().cl_synced_signals, DEFAULT_SYNC_THRESHOLD - 1);
        assert_eq!(drain(&mut updates), [false]);
    }

    #[test]
    fn every_negative_signal_is_published() {
        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);

        monitor.process_event(CL_NOT_SYNCED);
        monitor.process_event(CL_NOT_SYNCED);
        monitor.process_event(CL_NOT_SYNCED);

        assert_eq!(drain(&mut updates), [false, false, false]);
    }

    #[test]
    fn synced_consensus_layer_falls_back_on_negative_signal() {
        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);

        for _ in 0..DEFAULT_SYNC_THRESHOLD {
            monitor.process_event(CL_SYNCED);
        }

        monitor.process_event(CL_NOT_SYNCED);

        assert_eq!(monitor.cl_status(), ClStatus::NotSynced);
        assert_eq!(monitor.status().cl_synced_signals, 0);
        assert_eq!(drain(&mut updates), [true, false]);
    }

    #[test_case(1)]
    #[test_case(3)]
    fn custom_threshold(threshold: u64) {
        let monitor = SyncStatusMonitor::new(SyncMonitorConfig { threshold }, None);

        for _ in 1..threshold {
            monitor.process_event(CL_SYNCED);
        }

        assert_eq!(monitor.cl_status(), ClStatus::NotSynced);

        monitor.process_event(CL_SYNCED);

        assert_eq!(monitor.cl_status(), ClStatus::Synced);
    }

    #[test_case(ElStatus::Disconnected, Topic::ElSyncStatus, true => ElStatus::Synced)]
    #[test_case(ElStatus::Synced, Topic::ElSyncStatus, false => ElStatus::NotSynced)]
    #[test_case(ElStatus::Synced, Topic::ElConnection, false => ElStatus::Disconnected)]
    #[test_case(ElStatus::Disconnected, Topic::ElConnection, true => ElStatus::NotSynced)]
    #[test_case(ElStatus::Synced, Topic::ElConnection, true => ElStatus::Synced)]
    #[test_case(ElStatus::NotSynced, Topic::ElConnection, true => ElStatus::NotSynced)]
    fn execution_layer_transitions(initial: ElStatus, topic: Topic, data: bool) -> ElStatus {
        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);

        monitor.status.write().el_status = initial;
        monitor.process_event(Event::new(topic, data));

        assert!(drain(&mut updates).is_empty());

        monitor.el_status()
    }

    #[test]
    fn healthy_requires_both_layers() {
        let monitor = SyncStatusMonitor::default();

        for _ in 0..DEFAULT_SYNC_THRESHOLD {
            monitor.process_event(CL_SYNCED);
        }

        assert!(!monitor.healthy());

        monitor.process_event(Event::new(Topic::ElSyncStatus, true));

        assert!(monitor.healthy());

        monitor.process_event(Event::new(Topic::ElConnection, false));

        assert!(!monitor.healthy());
    }

    #[test]
    fn unexpected_topics_are_logged_and_ignored() {
        testing_logger::setup();

        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);

        monitor.process_event(Event::new(Topic::NewSlot, true));

        assert_eq!(monitor.status(), SyncStatus::default());
        assert!(drain(&mut updates).is_empty());

        testing_logger::validate(|logs| {
            let warnings = logs
                .iter()
                .filter(|log| log.level == Level::Warn)
                .map(|log| log.body.as_str())
                .collect::<Vec<_>>();

            assert_eq!(
                warnings,
                ["sync status monitor received unexpected event (topic: new_slot, data: true)"],
            );
        });
    }

    #[test]
    fn metrics_do_not_change_behavior() -> Result<()> {
        let metrics = Arc::new(Metrics::new()?);
        let monitor = SyncStatusMonitor::new(SyncMonitorConfig::default(), Some(metrics));

        for _ in 0..DEFAULT_SYNC_THRESHOLD {
            monitor.process_event(CL_SYNCED);
        }

        assert_eq!(monitor.cl_status(), ClStatus::Synced);

        Ok(())
    }

    #[tokio::test]
    async fn started_monitor_publishes_status_updates() -> Result<()> {
        let signals = EventRelay::default();
        let monitor = SyncStatusMonitor::default();
        let mut updates = monitor.subscribe(DEFAULT_SUBSCRIBER_CAPACITY);
        let token = CancellationToken::new();

        assert_eq!(monitor.relay().subscriber_count(), 1);

        let handle = monitor.start(
            signals.add_subscriber(DEFAULT_SUBSCRIBER_CAPACITY),
            token.clone(),
        );

        signals.notify(Event::new(Topic::ElSyncStatus, true));

        for _ in 0..DEFAULT_SYNC_THRESHOLD {
            signals.notify(CL_SYNCED);
        }

        assert_eq!(
            updates.recv().await,
            Some(Event::new(Topic::SyncStatusUpdate, true)),
        );
        assert!(monitor.healthy());

        token.cancel();
        handle.await?;

        assert_eq!(signals.subscriber_count(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_monitor_releases_its_subscription() -> Result<()> {
        let signals = EventRelay::<Event<bool>>::default();
        let monitor = SyncStatusMonitor::default();
        let token = CancellationToken::new();

        token.cancel();

        monitor
            .start(signals.add_subscriber(DEFAULT_SUBSCRIBER_CAPACITY), token)
            .await?;

        assert_eq!(signals.subscriber_count(), 0);

        signals.notify(CL_SYNCED);

        assert_eq!(monitor.status(), SyncStatus::default());

        Ok(())
    }

    #[tokio::test]
    async fn monitor_stops_when_signal_relay_closes() -> Result<()> {
        let signals = EventRelay::default();
        let monitor = SyncStatusMonitor::default();

        let handle = monitor.start(
            signals.add_subscriber(DEFAULT_SUBSCRIBER_CAPACITY),
            CancellationToken::new(),
        );

        signals.notify(CL_NOT_SYNCED);
        signals.close();

        handle.await?;

        assert_eq!(monitor.cl_status(), ClStatus::NotSynced);

        Ok(())
    }
}
