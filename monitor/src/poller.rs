//! Poll Loop
//!
//! Drives one cycle per tick:
//! SnapshotBuilder → AlertEvaluator → StatePublisher
//!
//! A cycle that panics is reported and skipped; the loop keeps its previous
//! alert state and tries again on the next tick.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, info, warn};

use common::logger::{TraceId, root_span};
use market::SnapshotBuilder;

use crate::alerts::{ActiveKeys, AlertEvaluator};
use crate::error::CycleError;
use crate::store::StatePublisher;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Evaluating,
    Publishing,
    Sleeping,
    Stopped,
}

/// Outcome of one successful cycle.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub trace_id: TraceId,
    pub quotes: usize,
    pub failed: usize,
    pub alerts: usize,
    pub newly_active: ActiveKeys,
    pub resolved: ActiveKeys,
}

pub struct Poller {
    builder: SnapshotBuilder,
    evaluator: AlertEvaluator,
    publisher: StatePublisher,
    active: ActiveKeys,
    interval: Duration,
    state: watch::Sender<PollState>,
}

impl Poller {
    pub fn new(
        builder: SnapshotBuilder,
        evaluator: AlertEvaluator,
        publisher: StatePublisher,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            builder,
            evaluator,
            publisher,
            active: ActiveKeys::new(),
            interval,
            state,
        }
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Keys that were breached at the end of the last successful cycle.
    pub fn active_keys(&self) -> &ActiveKeys {
        &self.active
    }

    fn set_state(&self, s: PollState) {
        self.state.send_replace(s);
    }

    /// Runs exactly one cycle.
    ///
    /// On error nothing is published and the active key set is unchanged.
    pub async fn tick(&mut self) -> Result<CycleReport, CycleError> {
        let trace_id = TraceId::default();
        let span = root_span("poll_cycle", &trace_id);

        let computed = {
            let this = &*self;
            AssertUnwindSafe(async move {
                this.set_state(PollState::Fetching);
                let snapshot = this.builder.build().await;

                this.set_state(PollState::Evaluating);
                let evaluation = this.evaluator.evaluate(&snapshot, &this.active);
                (snapshot, evaluation)
            })
            .catch_unwind()
            .instrument(span.clone())
            .await
        };

        let (snapshot, evaluation) = match computed {
            Ok(v) => v,
            Err(payload) => {
                self.set_state(PollState::Sleeping);
                return Err(CycleError::Panicked(panic_message(payload.as_ref())));
            }
        };

        let _enter = span.enter();
        self.set_state(PollState::Publishing);

        for key in &evaluation.newly_active {
            if let Some(alert) = evaluation.alert(key) {
                warn!(
                    subject = %alert.subject,
                    direction = %alert.direction,
                    value = alert.value,
                    threshold = alert.threshold,
                    "threshold breached"
                );
            }
        }
        for key in &evaluation.resolved {
            info!(alert = %key, "alert resolved");
        }

        let report = CycleReport {
            trace_id,
            quotes: snapshot.len(),
            failed: snapshot.failed_count(),
            alerts: evaluation.alerts.len(),
            newly_active: evaluation.newly_active,
            resolved: evaluation.resolved,
        };

        self.publisher.publish(snapshot, evaluation.alerts);
        self.active = evaluation.active;

        info!(
            quotes = report.quotes,
            failed = report.failed,
            alerts = report.alerts,
            "market snapshot published"
        );

        self.set_state(PollState::Sleeping);
        Ok(report)
    }

    /// Starts the loop on the runtime. The first cycle runs immediately.
    ///
    /// Dropping the returned handle detaches the loop; only
    /// [`PollerHandle::shutdown`] stops it.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = self.state.subscribe();
        let span = tracing::info_span!("market_poller");
        let task = tokio::spawn(self.run(shutdown_rx).instrument(span));

        PollerHandle {
            shutdown: shutdown_tx,
            state,
            task,
        }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            every_ms = self.interval.as_millis() as u64,
            instruments = self.builder.instruments().len(),
            "market poller started"
        );

        loop {
            tokio::select! {
                biased;
                Ok(()) = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.tick().await {
                error!(error = %e, "poll cycle failed; retrying next tick");
            }
        }

        self.set_state(PollState::Stopped);
        info!("market poller stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Lifecycle handle for a spawned [`Poller`].
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<PollState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Signals stop and waits for the loop to exit. An in-flight cycle is
    /// allowed to finish first.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }
}
