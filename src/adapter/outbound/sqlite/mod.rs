//! SQLite persistence adapters.
//!
//! Provides the durable queue of undelivered progress saves using Diesel ORM.

pub mod database;
pub mod queue;

pub use queue::SqliteSaveQueue;
