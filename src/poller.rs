//! Background polling of the shared ambient state.
//!
//! [`StatePoller`] fetches `/state` on a fixed interval and writes every
//! successful result into the [`MoodStage`], so the last poll wins over a
//! local voice commit. A failed fetch is logged and the last known state
//! stays in place; the next tick simply tries again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::{AmbientState, MoodService};
use crate::stage::MoodStage;

pub struct StatePoller {
    service: Arc<dyn MoodService>,
    stage: MoodStage,
    cancel: CancellationToken,
    interval: Duration,
}

impl StatePoller {
    pub fn new(
        service: Arc<dyn MoodService>,
        stage: MoodStage,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            stage,
            cancel,
            interval,
        }
    }

    /// Runs until the token is cancelled. Sleeps before every fetch.
    pub async fn run(self) {
        info!(interval_ms = self.interval.as_millis() as u64, "state poller started");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("state poller cancelled");
                    break;
                }
                () = tokio::time::sleep(self.interval) => {
                    let fetched = tokio::select! {
                        () = self.cancel.cancelled() => break,
                        fetched = self.service.fetch_state() => fetched,
                    };
                    match fetched {
                        Ok(state) => self.apply(state),
                        Err(e) => {
                            warn!(error = %e, "state poll failed, keeping last known state");
                        }
                    }
                }
            }
        }
    }

    /// Replaces the held state unless the stage already shows exactly it.
    fn apply(&self, state: AmbientState) {
        if self.stage.ambient() == state {
            debug!(label = %state.label, "ambient state unchanged");
            return;
        }
        info!(label = %state.label, color = %state.color, "ambient state applied");
        self.stage.apply_ambient(state);
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> PollerHandle {
        let cancel = self.cancel.clone();
        PollerHandle {
            cancel,
            join: tokio::spawn(self.run()),
        }
    }
}

/// Owner of a spawned poller task.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancels the poller and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!(error = %e, "state poller task ended abnormally");
        }
    }
}
