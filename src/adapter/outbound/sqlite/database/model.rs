//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::pending_saves;

/// Database row for an undelivered save (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = pending_saves)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PendingSaveRow {
    pub id: i32,
    pub revision: i64,
    pub level: i32,
    pub completed_json: String,
    pub queued_at: String,
}

/// Database row for an undelivered save (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = pending_saves)]
pub struct NewPendingSaveRow {
    pub revision: i64,
    pub level: i32,
    pub completed_json: String,
    pub queued_at: String,
}
