//! Save coordination against the progress store.
//!
//! At most one save is in flight. A snapshot submitted while one is pending
//! waits in a single slot; a newer submit replaces it. When the in-flight
//! save settles the waiting snapshot is sent next. Saves that fail after
//! retries land in the durable [`PendingSaveQueue`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::retry::RetryPolicy;
use crate::domain::{ProgressSnapshot, SaveReceipt, SaveState};
use crate::error::Result;
use crate::port::outbound::{PendingSaveQueue, ProgressStore};

/// How a submitted snapshot was settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The store accepted the snapshot the receipt names.
    ///
    /// When saves were coalesced this is the receipt of the newest one.
    Committed(SaveReceipt),
    /// Another save was in flight; this snapshot will be sent after it.
    Coalesced,
    /// The store could not be reached; the snapshot is in the durable queue.
    Queued { attempts: u32, error: String },
}

impl SaveOutcome {
    #[must_use]
    pub fn receipt(&self) -> Option<&SaveReceipt> {
        match self {
            Self::Committed(receipt) => Some(receipt),
            Self::Coalesced | Self::Queued { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Local,
    Queue,
}

#[derive(Debug, Default)]
struct Slot {
    state: SaveState,
    waiting: Option<ProgressSnapshot>,
}

/// Serializes saves to one store.
pub struct SaveCoordinator {
    store: Arc<dyn ProgressStore>,
    queue: Arc<dyn PendingSaveQueue>,
    policy: RetryPolicy,
    slot: Mutex<Slot>,
}

impl SaveCoordinator {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        queue: Arc<dyn PendingSaveQueue>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            queue,
            policy,
            slot: Mutex::new(Slot::default()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    #[must_use]
    pub fn queue(&self) -> &Arc<dyn PendingSaveQueue> {
        &self.queue
    }

    /// State of the most recent save operation.
    #[must_use]
    pub fn state(&self) -> SaveState {
        self.slot.lock().state
    }

    /// Whether a save is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == SaveState::Pending
    }

    /// Persist `snapshot`, or park it behind the in-flight save.
    ///
    /// # Errors
    ///
    /// Returns an error only if a failed save could not be written to the
    /// durable queue.
    pub async fn submit(&self, snapshot: ProgressSnapshot) -> Result<SaveOutcome> {
        if !self.try_begin(&snapshot, true) {
            return Ok(SaveOutcome::Coalesced);
        }
        self.drive(snapshot, Origin::Local).await
    }

    /// Send the newest queued snapshot.
    ///
    /// Returns `None` when the queue is empty or a save is already in
    /// flight (a successful in-flight save clears the queue on its own).
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub async fn flush_queue(&self) -> Result<Option<SaveOutcome>> {
        let Some(snapshot) = self.queue.latest().await? else {
            return Ok(None);
        };
        if !self.try_begin(&snapshot, false) {
            debug!(revision = snapshot.revision, "Save in flight, deferring queue flush");
            return Ok(None);
        }
        info!(revision = snapshot.revision, "Flushing queued save");
        self.drive(snapshot, Origin::Queue).await.map(Some)
    }

    /// Probe the store; on success flush the queue.
    ///
    /// # Errors
    ///
    /// Returns the probe failure, or a queue read failure.
    pub async fn health_check(&self) -> Result<Option<SaveOutcome>> {
        self.store.health().await?;
        debug!("Progress store healthy");
        self.flush_queue().await
    }

    /// Claim the slot. When busy, optionally park the snapshot instead.
    fn try_begin(&self, snapshot: &ProgressSnapshot, park_when_busy: bool) -> bool {
        let mut slot = self.slot.lock();
        match slot.state.restart() {
            Ok(pending) => {
                slot.state = pending;
                true
            }
            Err(_) => {
                if park_when_busy {
                    debug!(revision = snapshot.revision, "Save in flight, coalescing");
                    slot.waiting = Some(snapshot.clone());
                }
                false
            }
        }
    }

    async fn drive(&self, mut snapshot: ProgressSnapshot, mut origin: Origin) -> Result<SaveOutcome> {
        loop {
            let outcome = self.deliver(&snapshot, origin).await;

            let next = {
                let mut slot = self.slot.lock();
                slot.state = settle(slot.state, &outcome);
                let next = slot.waiting.take();
                if next.is_some() {
                    slot.state = slot.state.restart().unwrap_or_else(|e| {
                        error!(error = %e, "Save state out of step");
                        SaveState::Pending
                    });
                }
                next
            };

            match next {
                Some(waiting) => {
                    debug!(revision = waiting.revision, "Sending coalesced save");
                    snapshot = waiting;
                    origin = Origin::Local;
                }
                None => return outcome,
            }
        }
    }

    async fn deliver(&self, snapshot: &ProgressSnapshot, origin: Origin) -> Result<SaveOutcome> {
        let result = self
            .policy
            .run(|attempt| {
                debug!(revision = snapshot.revision, attempt, "Saving progress");
                self.store.save(snapshot)
            })
            .await;

        match result {
            Ok(receipt) => {
                match self.queue.clear().await {
                    Ok(0) => {}
                    Ok(cleared) => debug!(cleared, "Cleared superseded queued saves"),
                    Err(e) => warn!(error = %e, "Failed to clear save queue"),
                }
                info!(
                    revision = receipt.revision,
                    completed = ?receipt.completed.as_ref().map(Vec::len),
                    "Progress saved"
                );
                Ok(SaveOutcome::Committed(receipt))
            }
            Err(exhausted) => {
                if origin == Origin::Local {
                    self.queue.enqueue(snapshot).await?;
                }
                warn!(
                    revision = snapshot.revision,
                    attempts = exhausted.attempts,
                    error = %exhausted.error,
                    "Save failed, queued for later delivery"
                );
                Ok(SaveOutcome::Queued {
                    attempts: exhausted.attempts,
                    error: exhausted.error.to_string(),
                })
            }
        }
    }
}

/// Terminal state for a delivery result. Never leaves the slot pending.
fn settle(state: SaveState, outcome: &Result<SaveOutcome>) -> SaveState {
    let next = match outcome {
        Ok(SaveOutcome::Committed(_)) => state.commit(),
        Ok(SaveOutcome::Queued { .. }) => state.fail().and_then(SaveState::queue),
        Ok(SaveOutcome::Coalesced) | Err(_) => state.fail(),
    };
    next.unwrap_or_else(|e| {
        error!(error = %e, "Save state out of step");
        SaveState::Failed
    })
}
