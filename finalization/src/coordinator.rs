use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use event_relay::{EventRelay, Subscriber};
use fork_choice_tracker::{ForkChoiceStore, ForkChoiceTracker};
use log::{debug, warn};
use parking_lot::Mutex;
use prometheus_metrics::Metrics;
use tokio::{sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use types::{
    containers::BeaconBlockInfo,
    events::{Event, Topic},
    primitives::ExecutionBlockHash,
};

use crate::{
    engine::{EngineCaller, FinalizationError, FinalizationObserver},
    request::FinalizationRequest,
};

type CallId = u64;

struct InFlight {
    id: CallId,
    block_hash: ExecutionBlockHash,
    token: CancellationToken,
}

#[derive(Default)]
struct State {
    pending: Option<FinalizationRequest>,
    in_flight: Option<InFlight>,
    next_call_id: CallId,
}

#[derive(Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    superseded: AtomicU64,
}

/// Drives execution engine finalization calls, one block at a time.
///
/// Only the latest request matters. A new request cancels the call in flight and replaces any
/// request that has not been dispatched yet. Every call runs in its own task so that a slow
/// engine never delays the handling of newer requests.
pub struct FinalizationCoordinator<E, S> {
    engine: Arc<E>,
    tracker: Option<ForkChoiceTracker<S>>,
    observer: Option<Arc<dyn FinalizationObserver>>,
    state: Arc<Mutex<State>>,
    wake: Arc<Notify>,
    counters: Arc<Counters>,
    finalized: EventRelay<Event<ExecutionBlockHash>>,
    metrics: Option<Arc<Metrics>>,
}

impl<E, S: Clone> Clone for FinalizationCoordinator<E, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            tracker: self.tracker.clone(),
            observer: self.observer.clone(),
            state: Arc::clone(&self.state),
            wake: Arc::clone(&self.wake),
            counters: Arc::clone(&self.counters),
            finalized: self.finalized.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<E: EngineCaller, S: ForkChoiceStore> FinalizationCoordinator<E, S> {
    #[must_use]
    pub fn new(
        engine: Arc<E>,
        tracker: Option<ForkChoiceTracker<S>>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            engine,
            tracker,
            observer: None,
            state: Arc::default(),
            wake: Arc::default(),
            counters: Arc::default(),
            finalized: EventRelay::new(metrics.clone()),
            metrics,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FinalizationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Subscribes to [`Topic::FinalizedBlock`] events published after successful calls.
    #[must_use]
    pub fn subscribe(&self, capacity: usize) -> Subscriber<Event<ExecutionBlockHash>> {
        self.finalized.add_subscriber(capacity)
    }

    pub fn request_finalization(
        &self,
        block_hash: ExecutionBlockHash,
        beacon_block_info: BeaconBlockInfo,
    ) {
        features::log!(
            DebugFinalization,
            "finalization requested (block_hash: {block_hash:?}, slot: {})",
            beacon_block_info.slot,
        );

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.finalization_requests.inc();
        }

        let request = FinalizationRequest::new(block_hash, beacon_block_info);

        {
            let mut state = self.state.lock();

            if let Some(in_flight) = state.in_flight.take() {
                debug!(
                    "cancelling finalization of {:?} in favor of {block_hash:?}",
                    in_flight.block_hash,
                );

                in_flight.token.cancel();
                self.record_supersession();
            }

            if let Some(stale) = state.pending.replace(request) {
                debug!(
                    "dropping pending finalization of {:?} in favor of {block_hash:?}",
                    stale.block_hash,
                );

                self.record_supersession();
            }
        }

        self.wake.notify_one();
    }

    pub fn start(&self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(token))
    }

    pub async fn run(self, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                () = token.cancelled() => break,

                () = self.wake.notified() => self.dispatch(&token),
            }
        }

        // Calls in flight hold child tokens and have been cancelled along with `token`.
        self.state.lock().in_flight = None;

        debug!("finalization coordinator stopped");
    }

    #[must_use]
    pub fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn superseded(&self) -> u64 {
        self.counters.superseded.load(Ordering::Relaxed)
    }

    fn dispatch(&self, token: &CancellationToken) {
        let (request, call_id, call_token) = {
            let mut state = self.state.lock();

            let Some(request) = state.pending.take() else {
                return;
            };

            let call_id = state.next_call_id;
            let call_token = token.child_token();

            state.next_call_id += 1;
            state.in_flight = Some(InFlight {
                id: call_id,
                block_hash: request.block_hash,
                token: call_token.clone(),
            });

            (request, call_id, call_token)
        };

        tokio::spawn(
            self.clone()
                .process_finalization_request(request, call_id, call_token),
        );
    }

    async fn process_finalization_request(
        self,
        request: FinalizationRequest,
        call_id: CallId,
        token: CancellationToken,
    ) {
        let FinalizationRequest {
            block_hash,
            beacon_block_info,
        } = request;

        if token.is_cancelled() {
            debug!("finalization of {block_hash:?} cancelled before the engine was called");
            self.finish_call(call_id);
            return;
        }

        features::log!(
            DebugFinalization,
            "calling engine to finalize {block_hash:?} (slot: {})",
            beacon_block_info.slot,
        );

        let timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.start_finalization_call_timer());

        let result = self
            .engine
            .finalize_block(&token, &beacon_block_info, block_hash)
            .await;

        let cancelled = token.is_cancelled()
            || result
                .as_ref()
                .is_err_and(|error| error.downcast_ref::<FinalizationError>().is_some());

        if cancelled {
            prometheus_metrics::stop_and_discard(timer);

            match result {
                Ok(()) => debug!("finalization of {block_hash:?} completed after it was superseded"),
                Err(error) => debug!("finalization of {block_hash:?} cancelled: {error}"),
            }
        } else {
            prometheus_metrics::stop_and_record(timer);

            match result.and_then(|()| self.update_fork_choice(block_hash)) {
                Ok(()) => self.record_completion(block_hash),
                Err(error) => self.record_failure(&request, &error),
            }
        }

        self.finish_call(call_id);
    }

    fn update_fork_choice(&self, block_hash: ExecutionBlockHash) -> Result<()> {
        match self.tracker.as_ref() {
            Some(tracker) => tracker.insert_node(block_hash),
            None => Ok(()),
        }
    }

    fn finish_call(&self, call_id: CallId) {
        let mut state = self.state.lock();

        if state
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.id == call_id)
        {
            state.in_flight = None;
        }
    }

    fn record_completion(&self, block_hash: ExecutionBlockHash) {
        debug!("execution block {block_hash:?} finalized");

        self.counters.completed.fetch_add(1, Ordering::Relaxed);

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.finalization_completions.inc();
        }

        self.finalized
            .notify(Event::new(Topic::FinalizedBlock, block_hash));
    }

    fn record_failure(&self, request: &FinalizationRequest, error: &anyhow::Error) {
        warn!(
            "failed to finalize execution block {:?}: {error:?}",
            request.block_hash,
        );

        self.counters.failed.fetch_add(1, Ordering::Relaxed);

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.finalization_failures.inc();
        }

        if let Some(observer) = self.observer.as_ref() {
            observer.finalization_failed(request, error);
        }
    }

    fn record_supersession(&self) {
        self.counters.superseded.fetch_add(1, Ordering::Relaxed);

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.finalization_supersessions.inc();
        }
    }
}
