//! Store-agnostic domain logic.
//!
//! - [`availability`] - the quest availability engine (pure functions)
//! - [`catalog`] - lenient catalog decoding and lookup
//! - [`progress`] - per-user level and completed quests
//! - [`view`] - derived, never-persisted view types
//! - [`confirm`] - two-step confirmation gate
//! - [`save`] - save state machine and store payloads

pub mod availability;
pub mod catalog;
pub mod confirm;
pub mod error;
pub mod id;
pub mod item;
pub mod progress;
pub mod quest;
pub mod save;
pub mod view;

pub use catalog::{DecodeIssue, QuestCatalog, RawQuestRecord};
pub use id::QuestId;
pub use progress::{CompletedQuests, Transition, UserState};
pub use quest::{GroupBy, Quest};
pub use save::{ProgressSnapshot, ProgressSummary, SaveReceipt, SaveState};
pub use view::{BoardView, GroupSelector, GroupTab, LockReason, QuestOrder, ViewConfig, ViewMode};
