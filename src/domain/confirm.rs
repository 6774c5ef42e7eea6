//! Two-step confirmation for completion toggles.
//!
//! The first press on a quest arms it for a short window; a second press
//! on the same quest inside the window confirms. An arm that runs out is
//! dropped without notice. Time is passed in so callers and tests control
//! the clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::id::QuestId;

/// Default confirmation window.
pub const DEFAULT_CONFIRM_WINDOW: Duration = Duration::from_secs(3);

/// Result of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressResult {
    /// First press; a second press before `expires_at` will confirm.
    Armed { expires_at: Instant },
    /// Second press inside the window.
    Confirmed,
}

/// Tracks armed quests and their deadlines.
#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    window: Duration,
    armed: HashMap<QuestId, Instant>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_WINDOW)
    }
}

impl ConfirmationGate {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: HashMap::new(),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Register a press on `id` at `now`.
    pub fn press(&mut self, id: &QuestId, now: Instant) -> PressResult {
        self.expire(now);
        if self.armed.remove(id).is_some() {
            return PressResult::Confirmed;
        }
        let expires_at = now + self.window;
        self.armed.insert(id.clone(), expires_at);
        PressResult::Armed { expires_at }
    }

    /// Whether `id` is armed and still inside its window at `now`.
    #[must_use]
    pub fn is_armed(&self, id: &QuestId, now: Instant) -> bool {
        self.armed
            .get(id)
            .is_some_and(|&expires_at| now <= expires_at)
    }

    /// Drop a pending arm.
    pub fn disarm(&mut self, id: &QuestId) -> bool {
        self.armed.remove(id).is_some()
    }

    fn expire(&mut self, now: Instant) {
        self.armed.retain(|_, expires_at| now <= *expires_at);
    }
}
