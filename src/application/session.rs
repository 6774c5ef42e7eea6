//! A tracker bound to a save coordinator.
//!
//! Every local mutation is applied first and then persisted. Save failures
//! never roll the local state back; they surface as [`SyncStatus::Queued`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::sync::{SaveCoordinator, SaveOutcome};
use super::tracker::{PressOutcome, Reconciled, Tracker};
use crate::domain::{
    DecodeIssue, ProgressSnapshot, ProgressSummary, QuestCatalog, QuestId, Transition, UserState,
    ViewConfig,
};
use crate::error::Result;
use crate::port::outbound::QuestCatalogSource;

/// Where the current user state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    /// Loaded from the progress store.
    Store,
    /// Store unreachable; rebuilt from the newest undelivered save.
    Queue,
}

/// Persistence result of one mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Saved {
        reconciled: Reconciled,
        summary: ProgressSummary,
    },
    /// Parked behind an in-flight save.
    Coalesced,
    /// Not delivered; kept in the durable queue.
    Queued { attempts: u32, error: String },
}

/// One mutation and what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub transition: Option<Transition>,
    pub revision: u64,
    pub status: SyncStatus,
}

impl SyncReport {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self.status, SyncStatus::Saved { .. })
    }
}

pub struct Session {
    tracker: Tracker,
    saves: Arc<SaveCoordinator>,
    source: StateSource,
    issues: Vec<DecodeIssue>,
    summary: Option<ProgressSummary>,
}

impl Session {
    /// Fetch and decode the catalog, deliver any queued save, then load
    /// the user state.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched, or if the store
    /// is unreachable and nothing is queued to fall back on.
    pub async fn open(
        catalog_source: &dyn QuestCatalogSource,
        saves: Arc<SaveCoordinator>,
        view: ViewConfig,
        confirm_window: Duration,
    ) -> Result<Self> {
        let records = catalog_source.fetch_quests().await?;
        let (catalog, issues) = QuestCatalog::decode(records);
        info!(
            quests = catalog.len(),
            issues = issues.len(),
            "Quest catalog loaded"
        );

        if let Err(e) = saves.flush_queue().await {
            warn!(error = %e, "Could not read save queue");
        }

        let (state, source) = load_state(&saves).await?;
        Ok(Self {
            tracker: Tracker::new(Arc::new(catalog), state, view, confirm_window),
            saves,
            source,
            issues,
            summary: None,
        })
    }

    /// Build a session around an already-loaded tracker.
    #[must_use]
    pub fn from_parts(tracker: Tracker, saves: Arc<SaveCoordinator>) -> Self {
        Self {
            tracker,
            saves,
            source: StateSource::Store,
            issues: Vec::new(),
            summary: None,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }

    #[must_use]
    pub fn saves(&self) -> &SaveCoordinator {
        &self.saves
    }

    #[must_use]
    pub fn source(&self) -> StateSource {
        self.source
    }

    /// Records the catalog decoder had to repair or drop.
    #[must_use]
    pub fn issues(&self) -> &[DecodeIssue] {
        &self.issues
    }

    /// Statistics from the last committed save.
    #[must_use]
    pub fn summary(&self) -> Option<ProgressSummary> {
        self.summary
    }

    /// Flip `id` and persist.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown quests or if a failed save could not be
    /// queued.
    pub async fn toggle(&mut self, id: &QuestId) -> Result<SyncReport> {
        let (transition, snapshot) = self.tracker.toggle(id)?;
        self.persist(Some(transition), snapshot).await
    }

    /// Press the completion control; persists only on confirmation.
    ///
    /// # Errors
    ///
    /// Same as [`Session::toggle`].
    pub async fn press(&mut self, id: &QuestId, now: Instant) -> Result<Option<SyncReport>> {
        match self.tracker.press(id, now)? {
            PressOutcome::Armed { .. } => Ok(None),
            PressOutcome::Committed {
                transition,
                snapshot,
            } => self.persist(Some(transition), snapshot).await.map(Some),
        }
    }

    /// # Errors
    ///
    /// Returns an error for level 0 or if a failed save could not be queued.
    pub async fn set_level(&mut self, level: u32) -> Result<SyncReport> {
        let snapshot = self.tracker.set_level(level)?;
        self.persist(None, snapshot).await
    }

    /// Reset progress in the store, then locally.
    ///
    /// # Errors
    ///
    /// Returns the store error; local state is untouched in that case.
    pub async fn reset(&mut self) -> Result<()> {
        self.saves.store().reset().await?;
        let cleared = self.saves.queue().clear().await?;
        if cleared > 0 {
            info!(cleared, "Dropped queued saves after reset");
        }
        self.tracker.reset_local();
        self.summary = None;
        Ok(())
    }

    /// Reload the user state from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable and nothing is queued.
    pub async fn refresh(&mut self) -> Result<StateSource> {
        let (state, source) = load_state(&self.saves).await?;
        self.tracker.replace_state(state);
        self.source = source;
        Ok(source)
    }

    /// Probe the store and deliver queued saves.
    ///
    /// # Errors
    ///
    /// Returns the probe failure.
    pub async fn sync(&mut self) -> Result<Option<SaveOutcome>> {
        let outcome = self.saves.health_check().await?;
        if let Some(SaveOutcome::Committed(receipt)) = &outcome {
            self.summary = Some(receipt.summary);
            self.tracker.reconcile(receipt);
        }
        Ok(outcome)
    }

    async fn persist(
        &mut self,
        transition: Option<Transition>,
        snapshot: ProgressSnapshot,
    ) -> Result<SyncReport> {
        let revision = snapshot.revision;
        let status = match self.saves.submit(snapshot).await? {
            SaveOutcome::Committed(receipt) => {
                self.summary = Some(receipt.summary);
                SyncStatus::Saved {
                    reconciled: self.tracker.reconcile(&receipt),
                    summary: receipt.summary,
                }
            }
            SaveOutcome::Coalesced => SyncStatus::Coalesced,
            SaveOutcome::Queued { attempts, error } => {
                warn!(revision, attempts, "Progress kept locally, save queued");
                SyncStatus::Queued { attempts, error }
            }
        };
        Ok(SyncReport {
            transition,
            revision,
            status,
        })
    }
}

async fn load_state(saves: &SaveCoordinator) -> Result<(UserState, StateSource)> {
    match saves.store().load().await {
        Ok(state) => Ok((state, StateSource::Store)),
        Err(e) if e.is_retryable() => match saves.queue().latest().await? {
            Some(snapshot) => {
                warn!(
                    error = %e,
                    revision = snapshot.revision,
                    "Store unreachable, using newest queued save"
                );
                Ok((snapshot.to_state()?, StateSource::Queue))
            }
            None => Err(e),
        },
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::retry::RetryPolicy;
    use crate::error::StoreError;
    use crate::port::outbound::PendingSaveQueue;
    use crate::testkit::domain::{customs_catalog, customs_records};
    use crate::testkit::store::{MemoryQueue, ScriptedStore, StaticCatalog};

    fn saves(store: &Arc<ScriptedStore>, queue: &Arc<MemoryQueue>) -> Arc<SaveCoordinator> {
        Arc::new(SaveCoordinator::new(
            store.clone(),
            queue.clone(),
            RetryPolicy::no_retry(),
        ))
    }

    async fn open(store: &Arc<ScriptedStore>, queue: &Arc<MemoryQueue>) -> Session {
        Session::open(
            &StaticCatalog::new(customs_records()),
            saves(store, queue),
            ViewConfig::default(),
            Duration::from_secs(3),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn open_loads_catalog_and_state() {
        let store = Arc::new(ScriptedStore::with_state(
            UserState::with_completed(10, ["debut"]).unwrap(),
        ));
        let queue = Arc::new(MemoryQueue::new());

        let session = open(&store, &queue).await;

        assert_eq!(session.tracker().catalog().len(), customs_catalog().len());
        assert_eq!(session.source(), StateSource::Store);
        assert!(session.tracker().state().is_completed(&"debut".into()));
    }

    #[tokio::test]
    async fn cascade_from_store_is_reconciled() {
        let store = Arc::new(ScriptedStore::with_state(UserState::new(10).unwrap()));
        store.cascade("shooting-cans", ["debut"]);
        let queue = Arc::new(MemoryQueue::new());
        let mut session = open(&store, &queue).await;

        let report = session.toggle(&"shooting-cans".into()).await.unwrap();

        match report.status {
            SyncStatus::Saved { reconciled, .. } => assert_eq!(
                reconciled,
                Reconciled::Applied {
                    added: vec!["debut".into()],
                    removed: vec![],
                }
            ),
            other => panic!("expected saved, got {other:?}"),
        }
        assert!(session.tracker().state().is_completed(&"debut".into()));
        assert!(session.summary().is_some());
    }

    #[tokio::test]
    async fn failed_save_keeps_local_state() {
        let store = Arc::new(ScriptedStore::with_state(UserState::new(10).unwrap()));
        let queue = Arc::new(MemoryQueue::new());
        let mut session = open(&store, &queue).await;
        store.fail_next(1, StoreError::Unavailable("offline".into()));

        let report = session.toggle(&"debut".into()).await.unwrap();

        assert!(matches!(report.status, SyncStatus::Queued { .. }));
        assert!(session.tracker().state().is_completed(&"debut".into()));
        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn refresh_falls_back_to_queue_when_store_is_down() {
        let store = Arc::new(ScriptedStore::with_state(UserState::new(10).unwrap()));
        let queue = Arc::new(MemoryQueue::new());
        let mut session = open(&store, &queue).await;
        store.fail_next(1, StoreError::Unavailable("offline".into()));
        session.toggle(&"debut".into()).await.unwrap();

        store.set_healthy(false);
        let source = session.refresh().await.unwrap();

        assert_eq!(source, StateSource::Queue);
        assert!(session.tracker().state().is_completed(&"debut".into()));
    }

    #[tokio::test]
    async fn sync_delivers_queued_save() {
        let store = Arc::new(ScriptedStore::with_state(UserState::new(10).unwrap()));
        let queue = Arc::new(MemoryQueue::new());
        let mut session = open(&store, &queue).await;
        store.fail_next(1, StoreError::Unavailable("offline".into()));
        session.toggle(&"debut".into()).await.unwrap();

        let outcome = session.sync().await.unwrap();

        assert!(matches!(outcome, Some(SaveOutcome::Committed(_))));
        assert_eq!(queue.len().await.unwrap(), 0);
        assert!(store.state().is_completed(&"debut".into()));
    }

    #[tokio::test]
    async fn press_persists_only_on_confirmation() {
        let store = Arc::new(ScriptedStore::with_state(UserState::new(10).unwrap()));
        let queue = Arc::new(MemoryQueue::new());
        let mut session = open(&store, &queue).await;
        let now = Instant::now();

        assert!(session.press(&"debut".into(), now).await.unwrap().is_none());
        assert!(store.saved().is_empty());

        let report = session.press(&"debut".into(), now).await.unwrap().unwrap();
        assert!(report.is_saved());
        assert_eq!(report.transition, Some(Transition::Completed));
    }

    #[tokio::test]
    async fn reset_clears_store_and_local_state() {
        let store = Arc::new(ScriptedStore::with_state(
            UserState::with_completed(20, ["debut"]).unwrap(),
        ));
        let queue = Arc::new(MemoryQueue::new());
        let mut session = open(&store, &queue).await;

        session.reset().await.unwrap();

        assert_eq!(session.tracker().state(), &UserState::default());
        assert_eq!(store.state(), UserState::default());
    }

    #[tokio::test]
    async fn open_without_store_or_queue_fails() {
        let store = Arc::new(ScriptedStore::new());
        store.set_healthy(false);
        let queue = Arc::new(MemoryQueue::new());

        let result = Session::open(
            &StaticCatalog::new(customs_records()),
            saves(&store, &queue),
            ViewConfig::default(),
            Duration::from_secs(3),
        )
        .await;

        assert!(result.is_err());
    }
}
