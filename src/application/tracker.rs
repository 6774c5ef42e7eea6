//! Tracker controller.
//!
//! Owns the catalog, the user state, the view selection and the
//! confirmation gate. Every mutation bumps a local revision; snapshots carry
//! it so store receipts can be matched to the mutation they settle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::domain::availability::{self, lock_reason, unlocks_if_completed};
use crate::domain::confirm::{ConfirmationGate, PressResult};
use crate::domain::error::DomainError;
use crate::domain::{
    BoardView, GroupBy, GroupSelector, LockReason, ProgressSnapshot, Quest, QuestCatalog, QuestId,
    QuestOrder, SaveReceipt, Transition, UserState, ViewConfig, ViewMode,
};
use crate::error::Result;

/// Result of pressing a quest's completion control.
#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    /// First press; press again before `expires_at` to confirm.
    Armed { expires_at: Instant },
    /// Confirmed; the local state already reflects the change.
    Committed {
        transition: Transition,
        snapshot: ProgressSnapshot,
    },
}

/// Result of applying a store receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Local completed set replaced by the store's.
    Applied {
        /// Marked completed by the store but not locally (cascades).
        added: Vec<QuestId>,
        /// Completed locally but dropped by the store.
        removed: Vec<QuestId>,
    },
    /// The receipt settles an older revision and was ignored.
    Stale { receipt: u64, current: u64 },
    /// The receipt carried no completed set; the local set stands.
    Kept,
}

pub struct Tracker {
    catalog: Arc<QuestCatalog>,
    state: UserState,
    config: ViewConfig,
    gate: ConfirmationGate,
    revision: u64,
}

impl Tracker {
    #[must_use]
    pub fn new(
        catalog: Arc<QuestCatalog>,
        state: UserState,
        config: ViewConfig,
        confirm_window: Duration,
    ) -> Self {
        Self {
            catalog,
            state,
            config,
            gate: ConfirmationGate::new(confirm_window),
            revision: 0,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn state(&self) -> &UserState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_view(&mut self, config: ViewConfig) {
        self.config = config;
    }

    pub fn set_group_by(&mut self, group_by: GroupBy) {
        if self.config.group_by != group_by {
            // Group keys differ between dimensions.
            self.config.group = GroupSelector::All;
        }
        self.config.group_by = group_by;
    }

    pub fn set_group(&mut self, group: GroupSelector) {
        self.config.group = group;
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.config.mode = mode;
    }

    pub fn set_order(&mut self, order: QuestOrder) {
        self.config.order = order;
    }

    /// Recompute the board from scratch.
    #[must_use]
    pub fn view(&self) -> BoardView<'_> {
        availability::derive_view(&self.catalog, &self.state, &self.config)
    }

    /// Why `id` is locked, or `None` if it is unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownQuest`] for ids outside the catalog.
    pub fn lock_reason(&self, id: &QuestId) -> Result<Option<LockReason>> {
        let quest = self.quest(id)?;
        Ok(lock_reason(quest, &self.catalog, &self.state))
    }

    /// Quests that list `id` as a prerequisite.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownQuest`] for ids outside the catalog.
    pub fn unlocks(&self, id: &QuestId) -> Result<Vec<&Quest>> {
        self.quest(id)?;
        Ok(unlocks_if_completed(id, &self.catalog))
    }

    /// Press the completion control of `id` at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownQuest`] for ids outside the catalog.
    pub fn press(&mut self, id: &QuestId, now: Instant) -> Result<PressOutcome> {
        self.quest(id)?;
        match self.gate.press(id, now) {
            PressResult::Armed { expires_at } => {
                debug!(quest_id = %id, "Completion armed");
                Ok(PressOutcome::Armed { expires_at })
            }
            PressResult::Confirmed => {
                let (transition, snapshot) = self.toggle(id)?;
                Ok(PressOutcome::Committed {
                    transition,
                    snapshot,
                })
            }
        }
    }

    /// Flip completion of `id` without confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownQuest`] for ids outside the catalog.
    pub fn toggle(&mut self, id: &QuestId) -> Result<(Transition, ProgressSnapshot)> {
        self.quest(id)?;
        self.gate.disarm(id);
        let transition = self.state.toggle(id);
        self.revision += 1;
        info!(quest_id = %id, ?transition, revision = self.revision, "Quest toggled");
        Ok((transition, self.snapshot()))
    }

    /// # Errors
    ///
    /// Returns [`DomainError::InvalidLevel`] for level 0.
    pub fn set_level(&mut self, level: u32) -> Result<ProgressSnapshot> {
        self.state.set_level(level)?;
        self.revision += 1;
        info!(level, revision = self.revision, "Level set");
        Ok(self.snapshot())
    }

    /// Current full state as a save payload.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::capture(self.revision, &self.state)
    }

    /// Apply the store's completed set if `receipt` settles the current
    /// revision and carries one.
    pub fn reconcile(&mut self, receipt: &SaveReceipt) -> Reconciled {
        if receipt.revision != self.revision {
            debug!(
                receipt = receipt.revision,
                current = self.revision,
                "Ignoring stale receipt"
            );
            return Reconciled::Stale {
                receipt: receipt.revision,
                current: self.revision,
            };
        }

        let Some(completed) = &receipt.completed else {
            debug!(revision = self.revision, "Receipt without completed set, keeping local state");
            return Reconciled::Kept;
        };

        let added: Vec<QuestId> = completed
            .iter()
            .filter(|id| !self.state.is_completed(id))
            .cloned()
            .collect();
        let removed: Vec<QuestId> = self
            .state
            .completed()
            .iter()
            .filter(|id| !completed.contains(id))
            .cloned()
            .collect();

        self.state.replace_completed(completed.iter().cloned());
        if !added.is_empty() || !removed.is_empty() {
            info!(
                added = added.len(),
                removed = removed.len(),
                revision = self.revision,
                "Reconciled with store"
            );
        }
        Reconciled::Applied { added, removed }
    }

    /// Replace the whole user state, e.g. after a load from the store.
    pub fn replace_state(&mut self, state: UserState) {
        self.state = state;
        self.revision += 1;
    }

    /// Back to level 1 with nothing completed.
    pub fn reset_local(&mut self) {
        self.replace_state(UserState::default());
        info!(revision = self.revision, "Local progress reset");
    }

    /// Whether `id` is armed at `now`.
    #[must_use]
    pub fn is_armed(&self, id: &QuestId, now: Instant) -> bool {
        self.gate.is_armed(id, now)
    }

    fn quest(&self, id: &QuestId) -> Result<&Quest> {
        self.catalog.get(id).ok_or_else(|| {
            DomainError::UnknownQuest {
                quest_id: id.clone(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgressSummary;
    use crate::error::Error;
    use crate::testkit::domain::customs_catalog;

    fn tracker() -> Tracker {
        Tracker::new(
            Arc::new(customs_catalog()),
            UserState::new(10).unwrap(),
            ViewConfig::default(),
            Duration::from_secs(3),
        )
    }

    fn receipt(revision: u64, completed: &[&str]) -> SaveReceipt {
        SaveReceipt {
            revision,
            completed: Some(completed.iter().map(|id| (*id).into()).collect()),
            summary: ProgressSummary::default(),
        }
    }

    #[test]
    fn press_twice_within_window_commits() {
        let mut tracker = tracker();
        let id = QuestId::new("debut");
        let now = Instant::now();

        let first = tracker.press(&id, now).unwrap();
        assert!(matches!(first, PressOutcome::Armed { .. }));
        assert!(!tracker.state().is_completed(&id));

        let second = tracker.press(&id, now + Duration::from_secs(1)).unwrap();
        match second {
            PressOutcome::Committed {
                transition,
                snapshot,
            } => {
                assert_eq!(transition, Transition::Completed);
                assert_eq!(snapshot.revision, 1);
                assert_eq!(snapshot.completed, vec![id.clone()]);
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(tracker.state().is_completed(&id));
    }

    #[test]
    fn expired_arm_starts_over() {
        let mut tracker = tracker();
        let id = QuestId::new("debut");
        let now = Instant::now();

        tracker.press(&id, now).unwrap();
        let late = tracker.press(&id, now + Duration::from_secs(4)).unwrap();

        assert!(matches!(late, PressOutcome::Armed { .. }));
        assert!(!tracker.state().is_completed(&id));
        assert_eq!(tracker.revision(), 0);
    }

    #[test]
    fn uncompleting_goes_through_the_same_gate() {
        let mut tracker = tracker();
        let id = QuestId::new("debut");
        tracker.toggle(&id).unwrap();
        let now = Instant::now();

        tracker.press(&id, now).unwrap();
        let outcome = tracker.press(&id, now).unwrap();

        assert!(matches!(
            outcome,
            PressOutcome::Committed {
                transition: Transition::Uncompleted,
                ..
            }
        ));
    }

    #[test]
    fn unknown_quest_is_rejected() {
        let mut tracker = tracker();
        let result = tracker.toggle(&QuestId::new("nope"));
        assert!(matches!(
            result,
            Err(Error::Domain(DomainError::UnknownQuest { .. }))
        ));
        assert_eq!(tracker.revision(), 0);
    }

    #[test]
    fn optimistic_commit_updates_view_immediately() {
        let mut tracker = tracker();
        let before: Vec<_> = tracker
            .view()
            .entries
            .iter()
            .map(|entry| entry.quest.id.clone())
            .collect();
        assert!(!before.contains(&QuestId::new("shooting-cans")));

        tracker.toggle(&QuestId::new("debut")).unwrap();

        let after: Vec<_> = tracker
            .view()
            .entries
            .iter()
            .map(|entry| entry.quest.id.clone())
            .collect();
        assert!(after.contains(&QuestId::new("shooting-cans")));
        assert!(!after.contains(&QuestId::new("debut")));
    }

    #[test]
    fn reconcile_replaces_local_set() {
        let mut tracker = tracker();
        let (_, snapshot) = tracker.toggle(&QuestId::new("debut")).unwrap();

        let outcome = tracker.reconcile(&receipt(snapshot.revision, &["debut", "shooting-cans"]));

        assert_eq!(
            outcome,
            Reconciled::Applied {
                added: vec!["shooting-cans".into()],
                removed: vec![],
            }
        );
        assert!(tracker.state().is_completed(&"shooting-cans".into()));
    }

    #[test]
    fn receipt_without_completed_set_keeps_local_state() {
        let mut tracker = tracker();
        tracker.toggle(&QuestId::new("debut")).unwrap();
        let (_, snapshot) = tracker.toggle(&QuestId::new("gunsmith-1")).unwrap();
        let bare = SaveReceipt {
            completed: None,
            ..receipt(snapshot.revision, &[])
        };

        assert_eq!(tracker.reconcile(&bare), Reconciled::Kept);
        assert_eq!(tracker.state().completed().len(), 2);
        assert!(tracker.state().is_completed(&"gunsmith-1".into()));
    }

    #[test]
    fn stale_receipt_is_ignored() {
        let mut tracker = tracker();
        let (_, first) = tracker.toggle(&QuestId::new("debut")).unwrap();
        tracker.toggle(&QuestId::new("shooting-cans")).unwrap();

        let outcome = tracker.reconcile(&receipt(first.revision, &["debut"]));

        assert_eq!(
            outcome,
            Reconciled::Stale {
                receipt: 1,
                current: 2
            }
        );
        assert!(tracker.state().is_completed(&"shooting-cans".into()));
    }

    #[test]
    fn level_changes_bump_revision() {
        let mut tracker = tracker();
        let snapshot = tracker.set_level(15).unwrap();
        assert_eq!(snapshot.level, 15);
        assert_eq!(snapshot.revision, 1);
        assert!(tracker.set_level(0).is_err());
        assert_eq!(tracker.revision(), 1);
    }

    #[test]
    fn changing_dimension_resets_group() {
        let mut tracker = tracker();
        tracker.set_group(GroupSelector::parse("Customs"));
        tracker.set_group_by(GroupBy::Trader);
        assert_eq!(tracker.config().group, GroupSelector::All);
    }

    #[test]
    fn reset_local_clears_everything() {
        let mut tracker = tracker();
        tracker.toggle(&QuestId::new("debut")).unwrap();
        tracker.reset_local();
        assert_eq!(tracker.state().level(), 1);
        assert!(tracker.state().completed().is_empty());
    }
}
