//! Cross-session mutual exclusion and staleness tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{MoodError, Result};

/// Shared by every voice session: at most one may be recording or
/// processing, and each turn gets a generation number plus a cancellation
/// token so a superseded analysis result can be recognised and dropped.
#[derive(Debug, Clone)]
pub struct InteractionGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    permit: Arc<Semaphore>,
    generation: AtomicU64,
    /// Generation and token of the turn that currently holds the permit.
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
}

impl GateInner {
    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive right to record and submit, held from press until resolution.
#[derive(Debug)]
pub struct Turn {
    _permit: OwnedSemaphorePermit,
    generation: u64,
    cancel: CancellationToken,
    gate: Arc<GateInner>,
}

impl Drop for Turn {
    /// Clears the in-flight slot before the permit is released, unless a
    /// newer turn already owns it.
    fn drop(&mut self) {
        let mut in_flight = self.gate.lock_in_flight();
        if matches!(&*in_flight, Some((generation, _)) if *generation == self.generation) {
            *in_flight = None;
        }
    }
}

impl Turn {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for InteractionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionGate {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GateInner {
                permit: Arc::new(Semaphore::new(1)),
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Starts a turn, or fails with [`MoodError::SessionBusy`] while another
    /// turn is active.
    pub fn try_begin(&self) -> Result<Turn> {
        let permit = Arc::clone(&self.inner.permit)
            .try_acquire_owned()
            .map_err(|_| MoodError::SessionBusy)?;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        *self.inner.lock_in_flight() = Some((generation, cancel.clone()));
        Ok(Turn {
            _permit: permit,
            generation,
            cancel,
            gate: Arc::clone(&self.inner),
        })
    }

    /// Cancels the active turn's request; its result will be discarded.
    ///
    /// Returns `false` when nothing was in flight, including after the last
    /// turn has ended.
    pub fn supersede(&self) -> bool {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        match self.inner.lock_in_flight().take() {
            Some((generation, token)) => {
                token.cancel();
                info!(generation, "in-flight analysis superseded");
                true
            }
            None => false,
        }
    }

    /// Whether `turn` is still the newest and has not been cancelled.
    pub fn is_current(&self, turn: &Turn) -> bool {
        !turn.cancel.is_cancelled()
            && self.inner.generation.load(Ordering::SeqCst) == turn.generation
    }

    /// True while some turn holds the permit.
    pub fn is_busy(&self) -> bool {
        self.inner.permit.available_permits() == 0
    }
}
