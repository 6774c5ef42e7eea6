//! Infrastructure configuration modules.

pub mod logging;
pub mod retry;
pub mod settings;
pub mod store;
pub mod tracker;
