//! Durable queue port for saves that could not be delivered.

use async_trait::async_trait;

use crate::domain::save::ProgressSnapshot;
use crate::error::Result;

/// Local storage for undelivered saves.
///
/// Saves overwrite the whole remote state, so only the newest entry ever
/// needs delivering; older entries are kept until a flush clears them.
#[async_trait]
pub trait PendingSaveQueue: Send + Sync {
    /// Append a snapshot.
    async fn enqueue(&self, snapshot: &ProgressSnapshot) -> Result<()>;

    /// The most recently queued snapshot, if any.
    async fn latest(&self) -> Result<Option<ProgressSnapshot>>;

    /// Number of queued snapshots.
    async fn len(&self) -> Result<usize>;

    /// Remove every queued snapshot. Returns the count removed.
    async fn clear(&self) -> Result<usize>;
}
