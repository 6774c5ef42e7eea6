//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                  ┌─────────────────────────┐
//!                  │       Application       │
//!                  │ Tracker, SaveCoordinator│
//!                  └────────────┬────────────┘
//!           ┌───────────────────┼───────────────────┐
//!           ▼                   ▼                   ▼
//!    ┌─────────────┐    ┌───────────────┐    ┌──────────────┐
//!    │   Catalog   │    │ ProgressStore │    │ SaveQueue    │
//!    │   (HTTP)    │    │    (HTTP)     │    │ (SQLite)     │
//!    └─────────────┘    └───────────────┘    └──────────────┘
//! ```

pub mod outbound;
