//! SQLite pending-save queue.
//!
//! Saves that could not be delivered are appended as rows. Only the newest
//! row matters for delivery since every save carries the full state.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use tracing::debug;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{NewPendingSaveRow, PendingSaveRow};
use crate::adapter::outbound::sqlite::database::schema::pending_saves;
use crate::domain::{ProgressSnapshot, QuestId};
use crate::error::{Error, Result};
use crate::port::outbound::PendingSaveQueue;

/// SQLite-backed [`PendingSaveQueue`].
pub struct SqliteSaveQueue {
    pool: DbPool,
}

impl SqliteSaveQueue {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(snapshot: &ProgressSnapshot) -> Result<NewPendingSaveRow> {
        Ok(NewPendingSaveRow {
            revision: i64::try_from(snapshot.revision)
                .map_err(|e| Error::Parse(format!("revision out of range: {e}")))?,
            level: i32::try_from(snapshot.level)
                .map_err(|e| Error::Parse(format!("level out of range: {e}")))?,
            completed_json: serde_json::to_string(&snapshot.completed)?,
            queued_at: Utc::now().to_rfc3339(),
        })
    }

    fn from_row(row: PendingSaveRow) -> Result<ProgressSnapshot> {
        let completed: Vec<QuestId> = serde_json::from_str(&row.completed_json)
            .map_err(|e| Error::Parse(format!("pending save {}: {e}", row.id)))?;
        Ok(ProgressSnapshot {
            revision: u64::try_from(row.revision)
                .map_err(|e| Error::Parse(format!("pending save {}: {e}", row.id)))?,
            level: u32::try_from(row.level)
                .map_err(|e| Error::Parse(format!("pending save {}: {e}", row.id)))?,
            completed,
        })
    }

    fn connection(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>>
    {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }
}

#[async_trait]
impl PendingSaveQueue for SqliteSaveQueue {
    async fn enqueue(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        let row = Self::to_row(snapshot)?;
        let mut conn = self.connection()?;

        diesel::insert_into(pending_saves::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        debug!(revision = snapshot.revision, "Queued pending save");
        Ok(())
    }

    async fn latest(&self) -> Result<Option<ProgressSnapshot>> {
        let mut conn = self.connection()?;

        let row: Option<PendingSaveRow> = pending_saves::table
            .order(pending_saves::id.desc())
            .select(PendingSaveRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Self::from_row).transpose()
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.connection()?;

        let count: i64 = pending_saves::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn clear(&self) -> Result<usize> {
        let mut conn = self.connection()?;

        diesel::delete(pending_saves::table)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }
}
