//! Quest catalog port.

use async_trait::async_trait;

use crate::domain::catalog::RawQuestRecord;
use crate::error::Result;

/// Read-only source of quest records.
///
/// Records are returned undecoded; decoding is lenient and happens in
/// [`QuestCatalog::decode`](crate::domain::catalog::QuestCatalog::decode)
/// so one bad record never fails the whole load.
#[async_trait]
pub trait QuestCatalogSource: Send + Sync {
    /// Fetch every quest record.
    async fn fetch_quests(&self) -> Result<Vec<RawQuestRecord>>;
}
