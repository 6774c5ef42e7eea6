//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`store`] - In-memory port implementations: `ScriptedStore`,
//!   `MemoryQueue`, `StaticCatalog`.
//! - [`domain`] - Canonical catalog and builders for quests and user state.
//! - [`config`] - Canonical test configurations (retry, store, full config).

pub mod config;
pub mod domain;
pub mod store;
