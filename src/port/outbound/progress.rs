//! Progress store port.

use async_trait::async_trait;

use crate::domain::progress::UserState;
use crate::domain::save::{ProgressSnapshot, SaveReceipt};
use crate::error::Result;

/// Per-user progress persistence owned by the remote service.
///
/// # Errors
///
/// Transient failures should map to errors for which
/// [`Error::is_retryable`](crate::error::Error::is_retryable) holds.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the current user state.
    async fn load(&self) -> Result<UserState>;

    /// Replace the stored state with `snapshot`.
    ///
    /// Must be safe to repeat with the same payload. The receipt carries
    /// the authoritative completed set, which may include quests the
    /// store completed on its own.
    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<SaveReceipt>;

    /// Reset to level 1 with nothing completed.
    async fn reset(&self) -> Result<()>;

    /// Cheap liveness probe.
    async fn health(&self) -> Result<()>;
}
