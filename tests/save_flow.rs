//! Save delivery through the coordinator, the SQLite queue and a session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_test::{assert_err, assert_ok};

use questboard::adapter::outbound::sqlite::database::connection;
use questboard::adapter::outbound::sqlite::SqliteSaveQueue;
use questboard::application::tracker::Reconciled;
use questboard::application::{
    RetryPolicy, SaveCoordinator, SaveOutcome, Session, StateSource, SyncStatus,
};
use questboard::domain::{ProgressSnapshot, QuestId, SaveState, ViewConfig};
use questboard::error::StoreError;
use questboard::port::outbound::{PendingSaveQueue, ProgressStore};
use questboard::testkit::config::fast_retry;
use questboard::testkit::domain::{customs_records, user};
use questboard::testkit::store::{ScriptedStore, StaticCatalog};

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<ScriptedStore>,
    queue: Arc<SqliteSaveQueue>,
    saves: Arc<SaveCoordinator>,
}

fn harness(store: ScriptedStore, attempts: u32) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.db");
    let pool = connection::open(path.to_str().unwrap()).unwrap();
    let store = Arc::new(store);
    let queue = Arc::new(SqliteSaveQueue::new(pool));
    let saves = Arc::new(SaveCoordinator::new(
        store.clone(),
        queue.clone(),
        RetryPolicy::from_config(&fast_retry(attempts)),
    ));
    Harness {
        _dir: dir,
        store,
        queue,
        saves,
    }
}

fn snapshot(revision: u64, completed: &[&str]) -> ProgressSnapshot {
    ProgressSnapshot {
        revision,
        level: 3,
        completed: completed.iter().copied().map(QuestId::from).collect(),
    }
}

async fn open_session(h: &Harness) -> Session {
    let catalog = StaticCatalog::new(customs_records());
    Session::open(
        &catalog,
        h.saves.clone(),
        ViewConfig::default(),
        Duration::from_secs(3),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn outage_queues_then_health_check_delivers() {
    let h = harness(ScriptedStore::new(), 3);
    h.store.set_healthy(false);

    let outcome = h.saves.submit(snapshot(1, &["debut"])).await.unwrap();

    assert!(matches!(outcome, SaveOutcome::Queued { attempts: 3, .. }));
    assert_eq!(h.saves.state(), SaveState::Queued);
    assert_eq!(h.queue.len().await.unwrap(), 1);

    assert_err!(h.saves.health_check().await);
    assert_eq!(h.queue.len().await.unwrap(), 1);

    h.store.set_healthy(true);
    let delivered = h.saves.health_check().await.unwrap();

    assert!(matches!(delivered, Some(SaveOutcome::Committed(_))));
    assert_eq!(h.queue.len().await.unwrap(), 0);
    assert!(h.store.state().is_completed(&"debut".into()));
}

#[tokio::test]
async fn flush_sends_only_the_newest_queued_save() {
    let h = harness(ScriptedStore::new(), 1);
    assert_ok!(h.queue.enqueue(&snapshot(1, &["debut"])).await);
    assert_ok!(h.queue.enqueue(&snapshot(2, &["debut", "shooting-cans"])).await);

    let outcome = h.saves.flush_queue().await.unwrap().unwrap();

    assert_eq!(outcome.receipt().unwrap().revision, 2);
    assert_eq!(h.store.saved(), vec![snapshot(2, &["debut", "shooting-cans"])]);
    assert_eq!(h.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn rejected_save_is_queued_without_retrying() {
    let h = harness(ScriptedStore::new(), 4);
    h.store.fail_next(
        1,
        StoreError::Rejected {
            status: 422,
            message: "bad payload".into(),
        },
    );

    let outcome = h.saves.submit(snapshot(1, &["debut"])).await.unwrap();

    assert!(matches!(outcome, SaveOutcome::Queued { attempts: 1, .. }));
    assert_eq!(h.store.attempts(), 1);
    assert_eq!(h.queue.latest().await.unwrap(), Some(snapshot(1, &["debut"])));
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let h = harness(ScriptedStore::new(), 4);
    h.store
        .fail_next(2, StoreError::Timeout { timeout_ms: 500 });

    let outcome = h.saves.submit(snapshot(1, &["debut"])).await.unwrap();

    assert!(matches!(outcome, SaveOutcome::Committed(_)));
    assert_eq!(h.store.attempts(), 3);
    assert_eq!(h.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn session_open_delivers_queued_progress_first() {
    let h = harness(ScriptedStore::new(), 1);
    assert_ok!(h.queue.enqueue(&snapshot(7, &["debut"])).await);

    let session = open_session(&h).await;

    assert_eq!(session.source(), StateSource::Store);
    assert!(session.tracker().state().is_completed(&"debut".into()));
    assert_eq!(session.tracker().state().level(), 3);
    assert_eq!(h.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn session_falls_back_to_queue_while_store_is_down() {
    let h = harness(ScriptedStore::new(), 1);
    assert_ok!(h.queue.enqueue(&snapshot(7, &["debut"])).await);
    h.store.set_healthy(false);

    let session = open_session(&h).await;

    assert_eq!(session.source(), StateSource::Queue);
    assert!(session.tracker().state().is_completed(&"debut".into()));
    assert_eq!(h.queue.len().await.unwrap(), 1);
}

#[tokio::test]
async fn confirmed_completion_reconciles_store_cascade() {
    let h = harness(ScriptedStore::with_state(user(5, &["debut"])), 2);
    h.store.cascade("checking", ["shooting-cans"]);
    let mut session = open_session(&h).await;
    let id = QuestId::from("checking");
    let now = Instant::now();

    assert!(session.press(&id, now).await.unwrap().is_none());
    assert!(!session.tracker().state().is_completed(&id));

    let report = session
        .press(&id, now + Duration::from_millis(500))
        .await
        .unwrap()
        .unwrap();

    match report.status {
        SyncStatus::Saved { reconciled, .. } => assert_eq!(
            reconciled,
            Reconciled::Applied {
                added: vec!["shooting-cans".into()],
                removed: vec![],
            }
        ),
        other => panic!("expected a committed save, got {other:?}"),
    }
    let state = session.tracker().state();
    assert!(state.is_completed(&id));
    assert!(state.is_completed(&"shooting-cans".into()));
}

#[tokio::test]
async fn stats_only_answer_keeps_optimistic_progress() {
    let h = harness(
        ScriptedStore::with_state(user(5, &["debut", "gunsmith-1"])),
        1,
    );
    h.store.set_stats_only(true);
    let mut session = open_session(&h).await;

    let report = session.toggle(&"shooting-cans".into()).await.unwrap();

    match report.status {
        SyncStatus::Saved { reconciled, .. } => assert_eq!(reconciled, Reconciled::Kept),
        other => panic!("expected a committed save, got {other:?}"),
    }
    let state = session.tracker().state();
    assert_eq!(state.completed().len(), 3);
    assert!(state.is_completed(&"shooting-cans".into()));

    session.toggle(&"checking".into()).await.unwrap();
    let last = h.store.saved().pop().unwrap();
    assert_eq!(last.completed.len(), 4);
}

#[tokio::test]
async fn expired_confirmation_changes_nothing() {
    let h = harness(ScriptedStore::new(), 1);
    let mut session = open_session(&h).await;
    let id = QuestId::from("debut");
    let now = Instant::now();

    assert!(session.press(&id, now).await.unwrap().is_none());
    let late = session
        .press(&id, now + Duration::from_secs(10))
        .await
        .unwrap();

    assert!(late.is_none());
    assert!(!session.tracker().state().is_completed(&id));
    assert!(h.store.saved().is_empty());
}

#[tokio::test]
async fn optimistic_update_survives_an_outage() {
    let h = harness(ScriptedStore::new(), 2);
    let mut session = open_session(&h).await;
    h.store.set_healthy(false);

    let report = session.toggle(&"debut".into()).await.unwrap();

    assert!(matches!(report.status, SyncStatus::Queued { attempts: 2, .. }));
    assert!(session.tracker().state().is_completed(&"debut".into()));
    assert_eq!(h.queue.latest().await.unwrap().unwrap().revision, report.revision);

    h.store.set_healthy(true);
    let outcome = session.sync().await.unwrap();
    assert!(matches!(outcome, Some(SaveOutcome::Committed(_))));
    assert!(h.store.state().is_completed(&"debut".into()));
}

#[tokio::test]
async fn reset_clears_store_queue_and_local_state() {
    let h = harness(ScriptedStore::with_state(user(4, &["debut"])), 1);
    let mut session = open_session(&h).await;
    assert_ok!(h.queue.enqueue(&snapshot(9, &["debut", "checking"])).await);

    session.reset().await.unwrap();

    assert_eq!(h.queue.len().await.unwrap(), 0);
    assert_eq!(session.tracker().state().level(), 1);
    assert!(session.tracker().state().completed().is_empty());
    assert!(h.store.load().await.unwrap().completed().is_empty());
}
