//! Questboard - quest progress tracking with a local availability engine.
//!
//! The crate fetches a quest catalog and per-user progress from a remote
//! tracker service, derives which quests are available, locked or finished,
//! and saves progress changes back with retries and a durable local queue.
//!
//! # Architecture
//!
//! - [`domain`] - Store-agnostic types and the availability engine
//! - [`port`] - Traits for the catalog, progress store and save queue
//! - [`application`] - Tracker, save coordination and sessions
//! - [`adapter`] - HTTP store, SQLite queue and the CLI
//! - [`infrastructure`] - Configuration and wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use questboard::domain::availability::derive_view;
//! use questboard::domain::{Quest, QuestCatalog, UserState, ViewConfig};
//!
//! let catalog = QuestCatalog::from_quests([
//!     Quest::new("debut", "Debut").with_map("Customs"),
//! ]);
//! let board = derive_view(&catalog, &UserState::default(), &ViewConfig::default());
//! assert_eq!(board.entries.len(), 1);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
