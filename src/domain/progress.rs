//! Per-user progress state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::QuestId;

/// Insertion-ordered set of completed quest ids.
///
/// An id appears at most once. Order carries no meaning for availability
/// but is kept for the activity feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedQuests {
    order: Vec<QuestId>,
    members: HashSet<QuestId>,
}

impl CompletedQuests {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &QuestId) -> bool {
        self.members.contains(id)
    }

    /// Insert an id; returns false if it was already present.
    pub fn insert(&mut self, id: QuestId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove an id; returns false if it was absent.
    pub fn remove(&mut self, id: &QuestId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &QuestId> {
        self.order.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<QuestId> {
        self.order.clone()
    }

    /// Whether every id in `other` is also in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &CompletedQuests) -> bool {
        self.members.is_superset(&other.members)
    }
}

impl FromIterator<QuestId> for CompletedQuests {
    fn from_iter<I: IntoIterator<Item = QuestId>>(iter: I) -> Self {
        let mut completed = Self::new();
        for id in iter {
            completed.insert(id);
        }
        completed
    }
}

impl Serialize for CompletedQuests {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.order.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompletedQuests {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Vec::<QuestId>::deserialize(deserializer)?;
        Ok(ids.into_iter().collect())
    }
}

/// Direction of a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Completed,
    Uncompleted,
}

/// A user's level and completed quests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(deserialize_with = "deserialize_level")]
    level: u32,
    #[serde(default, rename = "completed_quests")]
    completed: CompletedQuests,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            level: 1,
            completed: CompletedQuests::new(),
        }
    }
}

impl UserState {
    /// Create a state with no completed quests.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidLevel`] if `level` is 0.
    pub fn new(level: u32) -> Result<Self, DomainError> {
        validate_level(level)?;
        Ok(Self {
            level,
            completed: CompletedQuests::new(),
        })
    }

    /// Create a state with the given completed quests.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidLevel`] if `level` is 0.
    pub fn with_completed<I>(level: u32, completed: I) -> Result<Self, DomainError>
    where
        I: IntoIterator,
        I::Item: Into<QuestId>,
    {
        validate_level(level)?;
        Ok(Self {
            level,
            completed: completed.into_iter().map(Into::into).collect(),
        })
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn completed(&self) -> &CompletedQuests {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, id: &QuestId) -> bool {
        self.completed.contains(id)
    }

    /// # Errors
    ///
    /// Returns [`DomainError::InvalidLevel`] if `level` is 0.
    pub fn set_level(&mut self, level: u32) -> Result<(), DomainError> {
        validate_level(level)?;
        self.level = level;
        Ok(())
    }

    pub fn complete(&mut self, id: QuestId) -> bool {
        self.completed.insert(id)
    }

    pub fn uncomplete(&mut self, id: &QuestId) -> bool {
        self.completed.remove(id)
    }

    /// Flip a quest between complete and incomplete.
    pub fn toggle(&mut self, id: &QuestId) -> Transition {
        if self.completed.remove(id) {
            Transition::Uncompleted
        } else {
            self.completed.insert(id.clone());
            Transition::Completed
        }
    }

    /// Replace the completed set wholesale.
    ///
    /// Used when the store returns its authoritative set; local entries
    /// missing from `ids` are dropped.
    pub fn replace_completed(&mut self, ids: impl IntoIterator<Item = QuestId>) {
        self.completed = ids.into_iter().collect();
    }

    /// Most recent completions first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &QuestId> {
        self.completed.iter().rev().take(n)
    }
}

fn validate_level(level: u32) -> Result<(), DomainError> {
    if level == 0 {
        return Err(DomainError::InvalidLevel { level });
    }
    Ok(())
}

fn deserialize_level<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let level = u32::deserialize(deserializer)?;
    validate_level(level).map_err(serde::de::Error::custom)?;
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> QuestId {
        QuestId::from(s)
    }

    #[test]
    fn level_zero_is_rejected() {
        assert_eq!(
            UserState::new(0),
            Err(DomainError::InvalidLevel { level: 0 })
        );
        let mut state = UserState::new(3).unwrap();
        assert!(state.set_level(0).is_err());
        assert_eq!(state.level(), 3);
    }

    #[test]
    fn completed_ids_are_unique() {
        let mut state = UserState::default();
        assert!(state.complete(id("a")));
        assert!(!state.complete(id("a")));
        assert_eq!(state.completed().len(), 1);
    }

    #[test]
    fn toggle_goes_both_ways() {
        let mut state = UserState::default();
        assert_eq!(state.toggle(&id("a")), Transition::Completed);
        assert!(state.is_completed(&id("a")));
        assert_eq!(state.toggle(&id("a")), Transition::Uncompleted);
        assert!(!state.is_completed(&id("a")));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut state = UserState::with_completed(5, ["c", "a", "b"]).unwrap();
        state.uncomplete(&id("a"));
        state.complete(id("a"));
        let order: Vec<_> = state.completed().iter().map(QuestId::as_str).collect();
        assert_eq!(order, vec!["c", "b", "a"]);

        let recent: Vec<_> = state.recent(2).map(QuestId::as_str).collect();
        assert_eq!(recent, vec!["a", "b"]);
    }

    #[test]
    fn replace_completed_replaces_rather_than_merges() {
        let mut state = UserState::with_completed(5, ["a", "local-only"]).unwrap();
        state.replace_completed([id("a"), id("cascade"), id("a")]);
        let ids: Vec<_> = state.completed().iter().map(QuestId::as_str).collect();
        assert_eq!(ids, vec!["a", "cascade"]);
    }

    #[test]
    fn serde_uses_store_field_names() {
        let state = UserState::with_completed(7, ["a", "b"]).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["level"], 7);
        assert_eq!(json["completed_quests"], serde_json::json!(["a", "b"]));

        let back: UserState =
            serde_json::from_str(r#"{"level": 2, "completed_quests": ["x", "x", "y"]}"#).unwrap();
        assert_eq!(back.completed().len(), 2);

        let invalid = serde_json::from_str::<UserState>(r#"{"level": 0}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn superset_check() {
        let small: CompletedQuests = [id("a")].into_iter().collect();
        let large: CompletedQuests = [id("a"), id("b")].into_iter().collect();
        assert!(large.is_superset(&small));
        assert!(!small.is_superset(&large));
    }
}
