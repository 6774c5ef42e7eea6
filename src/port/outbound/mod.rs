//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the external collaborators: the read-only quest
//! catalog, the per-user progress store, and the durable local queue that
//! holds saves the store could not accept.

pub mod catalog;
pub mod progress;
pub mod queue;

pub use catalog::QuestCatalogSource;
pub use progress::ProgressStore;
pub use queue::PendingSaveQueue;
