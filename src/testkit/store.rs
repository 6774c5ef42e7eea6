//! In-memory stand-ins for the outbound ports.
//!
//! - [`ScriptedStore`]: a [`ProgressStore`] with failure injection,
//!   latency and server-side cascades.
//! - [`MemoryQueue`]: a [`PendingSaveQueue`] kept in a `Vec`.
//! - [`StaticCatalog`]: a [`QuestCatalogSource`] serving fixed records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{
    ProgressSnapshot, ProgressSummary, QuestId, RawQuestRecord, SaveReceipt, UserState,
};
use crate::error::{Result, StoreError};
use crate::port::outbound::{PendingSaveQueue, ProgressStore, QuestCatalogSource};

// ---------------------------------------------------------------------------
// ScriptedStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedState {
    user: UserState,
    healthy: bool,
    failures: Vec<StoreError>,
    latency: Duration,
    cascades: HashMap<QuestId, Vec<QuestId>>,
    saved: Vec<ProgressSnapshot>,
    stats_only: bool,
}

/// A progress store whose failures are scripted by the test.
///
/// While unhealthy every call fails with [`StoreError::Unavailable`].
/// Failures queued with [`ScriptedStore::fail_next`] apply to saves only.
pub struct ScriptedStore {
    inner: Mutex<ScriptedState>,
    attempts: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::with_state(UserState::default())
    }

    pub fn with_state(user: UserState) -> Self {
        Self {
            inner: Mutex::new(ScriptedState {
                user,
                healthy: true,
                ..ScriptedState::default()
            }),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` saves with `error`.
    pub fn fail_next(&self, n: usize, error: StoreError) {
        let mut inner = self.inner.lock();
        inner.failures.extend(std::iter::repeat(error).take(n));
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.inner.lock().healthy = healthy;
    }

    /// Delay every save by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().latency = latency;
    }

    /// Answer saves with statistics only, leaving out the completed set.
    pub fn set_stats_only(&self, stats_only: bool) {
        self.inner.lock().stats_only = stats_only;
    }

    /// Completing `trigger` also completes `also`, the way the real store
    /// auto-completes prerequisites.
    pub fn cascade<I, T>(&self, trigger: &str, also: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<QuestId>,
    {
        self.inner
            .lock()
            .cascades
            .insert(trigger.into(), also.into_iter().map(Into::into).collect());
    }

    /// Current server-side state.
    pub fn state(&self) -> UserState {
        self.inner.lock().user.clone()
    }

    /// Snapshots accepted so far, in order.
    pub fn saved(&self) -> Vec<ProgressSnapshot> {
        self.inner.lock().saved.clone()
    }

    /// Save calls made, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn check_healthy(&self) -> Result<()> {
        if self.inner.lock().healthy {
            Ok(())
        } else {
            Err(StoreError::Unavailable("scripted outage".into()).into())
        }
    }
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for ScriptedStore {
    async fn load(&self) -> Result<UserState> {
        self.check_healthy()?;
        Ok(self.state())
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<SaveReceipt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let latency = self.inner.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.check_healthy()?;

        let mut inner = self.inner.lock();
        if !inner.failures.is_empty() {
            return Err(inner.failures.remove(0).into());
        }

        let mut completed = snapshot.completed.clone();
        for id in &snapshot.completed {
            if let Some(also) = inner.cascades.get(id) {
                for extra in also {
                    if !completed.contains(extra) {
                        completed.push(extra.clone());
                    }
                }
            }
        }

        let user = UserState::with_completed(snapshot.level, completed.iter().cloned())?;
        let total_completed = u32::try_from(completed.len()).unwrap_or(u32::MAX);
        inner.user = user;
        inner.saved.push(snapshot.clone());

        Ok(SaveReceipt {
            revision: snapshot.revision,
            completed: (!inner.stats_only).then_some(completed),
            summary: ProgressSummary {
                completion_rate: 0.0,
                total_completed,
            },
        })
    }

    async fn reset(&self) -> Result<()> {
        self.check_healthy()?;
        self.inner.lock().user = UserState::default();
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        self.check_healthy()
    }
}

// ---------------------------------------------------------------------------
// MemoryQueue
// ---------------------------------------------------------------------------

/// Pending saves held in memory.
#[derive(Default)]
pub struct MemoryQueue {
    entries: Mutex<Vec<ProgressSnapshot>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingSaveQueue for MemoryQueue {
    async fn enqueue(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.entries.lock().push(snapshot.clone());
        Ok(())
    }

    async fn latest(&self) -> Result<Option<ProgressSnapshot>> {
        Ok(self.entries.lock().last().cloned())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.lock().len())
    }

    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.lock();
        let cleared = entries.len();
        entries.clear();
        Ok(cleared)
    }
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

/// Serves a fixed batch of raw records.
pub struct StaticCatalog {
    records: Vec<RawQuestRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<RawQuestRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl QuestCatalogSource for StaticCatalog {
    async fn fetch_quests(&self) -> Result<Vec<RawQuestRecord>> {
        Ok(self.records.clone())
    }
}
