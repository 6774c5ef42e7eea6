//! Domain validation errors for core domain types.
//!
//! These errors are returned when a domain invariant would be violated,
//! for example setting a level below 1 or driving a save through an
//! illegal state transition.
//!
//! # Examples
//!
//! ```
//! use questboard::domain::error::DomainError;
//! use questboard::domain::progress::UserState;
//!
//! let result = UserState::new(0);
//! assert!(matches!(result, Err(DomainError::InvalidLevel { level: 0 })));
//! ```

use thiserror::Error;

use super::id::QuestId;
use super::save::SaveState;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Player levels start at 1.
    #[error("level must be at least 1, got {level}")]
    InvalidLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// The quest id is not part of the loaded catalog.
    #[error("unknown quest '{quest_id}'")]
    UnknownQuest {
        /// The id that failed to resolve.
        quest_id: QuestId,
    },

    /// A save operation was driven through a transition its state does not allow.
    #[error("invalid save transition from {from:?} via {event}")]
    InvalidSaveTransition {
        /// State the operation was in.
        from: SaveState,
        /// Name of the rejected event.
        event: &'static str,
    },
}
