//! Save operation state machine and payloads.
//!
//! ```text
//! Idle ──begin──▶ Pending ──commit──▶ Committed
//!                    │
//!                    └──fail──▶ Failed ──queue──▶ Queued
//! ```
//!
//! `Committed` and `Queued` are terminal for one operation; the next save
//! starts a fresh machine.

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::QuestId;
use super::progress::UserState;

/// State of one save operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Idle,
    Pending,
    Committed,
    Failed,
    Queued,
}

impl SaveState {
    /// Idle → Pending.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSaveTransition`] from any other state.
    pub fn begin(self) -> Result<Self, DomainError> {
        self.step("begin", Self::Idle, Self::Pending)
    }

    /// Pending → Committed.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSaveTransition`] from any other state.
    pub fn commit(self) -> Result<Self, DomainError> {
        self.step("commit", Self::Pending, Self::Committed)
    }

    /// Pending → Failed.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSaveTransition`] from any other state.
    pub fn fail(self) -> Result<Self, DomainError> {
        self.step("fail", Self::Pending, Self::Failed)
    }

    /// Failed → Queued.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSaveTransition`] from any other state.
    pub fn queue(self) -> Result<Self, DomainError> {
        self.step("queue", Self::Failed, Self::Queued)
    }

    /// Start the next operation: any state but `Pending` goes back to
    /// `Idle` and begins.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSaveTransition`] while a save is pending.
    pub fn restart(self) -> Result<Self, DomainError> {
        match self {
            Self::Pending => Err(DomainError::InvalidSaveTransition {
                from: self,
                event: "begin",
            }),
            _ => Self::Idle.begin(),
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Queued)
    }

    fn step(self, event: &'static str, from: Self, to: Self) -> Result<Self, DomainError> {
        if self == from {
            Ok(to)
        } else {
            Err(DomainError::InvalidSaveTransition { from: self, event })
        }
    }
}

/// Full-state payload sent to the progress store.
///
/// Saves overwrite the whole state, so sending the same snapshot twice is
/// harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Local revision that produced this snapshot.
    pub revision: u64,
    pub level: u32,
    pub completed: Vec<QuestId>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn capture(revision: u64, state: &UserState) -> Self {
        Self {
            revision,
            level: state.level(),
            completed: state.completed().to_vec(),
        }
    }

    /// Rebuild a user state from this snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidLevel`] if the stored level is 0.
    pub fn to_state(&self) -> Result<UserState, DomainError> {
        UserState::with_completed(self.level, self.completed.iter().cloned())
    }
}

/// Global statistics echoed by the store; displayed, never recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Completion rate in percent.
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub total_completed: u32,
}

/// Store response to a save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReceipt {
    /// Revision of the snapshot this receipt settles.
    pub revision: u64,
    /// Authoritative completed set, possibly expanded by server cascades.
    /// `None` when the store's answer did not include it.
    pub completed: Option<Vec<QuestId>>,
    pub summary: ProgressSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_commits() {
        let state = SaveState::Idle.begin().unwrap().commit().unwrap();
        assert_eq!(state, SaveState::Committed);
        assert!(state.is_terminal());
    }

    #[test]
    fn failure_path_queues() {
        let state = SaveState::Idle
            .begin()
            .and_then(SaveState::fail)
            .and_then(SaveState::queue)
            .unwrap();
        assert_eq!(state, SaveState::Queued);
        assert!(state.is_terminal());
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert_eq!(
            SaveState::Idle.commit(),
            Err(DomainError::InvalidSaveTransition {
                from: SaveState::Idle,
                event: "commit",
            })
        );
        assert!(SaveState::Pending.begin().is_err());
        assert!(SaveState::Pending.queue().is_err());
        assert!(SaveState::Committed.fail().is_err());
        assert!(!SaveState::Failed.is_terminal());
    }

    #[test]
    fn settled_states_restart_but_pending_does_not() {
        for settled in [
            SaveState::Idle,
            SaveState::Committed,
            SaveState::Failed,
            SaveState::Queued,
        ] {
            assert_eq!(settled.restart(), Ok(SaveState::Pending));
        }
        assert_eq!(
            SaveState::Pending.restart(),
            Err(DomainError::InvalidSaveTransition {
                from: SaveState::Pending,
                event: "begin",
            })
        );
    }

    #[test]
    fn snapshot_round_trips_state() {
        let state = UserState::with_completed(12, ["a", "b"]).unwrap();
        let snapshot = ProgressSnapshot::capture(4, &state);
        assert_eq!(snapshot.revision, 4);
        assert_eq!(snapshot.to_state().unwrap(), state);
    }
}
