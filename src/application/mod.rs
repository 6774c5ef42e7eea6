//! Application services sequencing the domain against the ports.
//!
//! - [`tracker`] - synchronous controller over catalog, state and view
//! - [`sync`] - save coordination, retry and the durable queue
//! - [`session`] - tracker plus saves, as used by the CLI
//! - [`retry`] - backoff policy

pub mod retry;
pub mod session;
pub mod sync;
pub mod tracker;

pub use retry::RetryPolicy;
pub use session::{Session, StateSource, SyncReport, SyncStatus};
pub use sync::{SaveCoordinator, SaveOutcome};
pub use tracker::{PressOutcome, Reconciled, Tracker};
