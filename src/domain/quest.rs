//! Quest definitions.
//!
//! A [`Quest`] is immutable for the lifetime of a session. Only the level
//! requirement, the prerequisite list and the goal flag take part in
//! availability decisions; the remaining fields are display data.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::QuestId;
use super::item::RequiredItem;

/// Group key for quests that are not tied to a single map.
pub const ANY_MAP: &str = "Any";

/// Grouping dimension for quest tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Group by the map the quest takes place on.
    #[default]
    Map,
    /// Group by the trader who hands out the quest.
    Trader,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => f.write_str("map"),
            Self::Trader => f.write_str("trader"),
        }
    }
}

/// A single quest objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub description: String,
    #[serde(default)]
    pub optional: bool,
}

/// A quest from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub name: String,
    /// Minimum player level, always at least 1.
    pub level_requirement: u32,
    /// Quests that must all be completed before this one unlocks.
    pub prerequisites: Vec<QuestId>,
    pub map: Option<String>,
    pub trader: String,
    /// Whether the quest counts toward the tracked completion goal.
    pub goal_relevant: bool,
    pub objectives: Vec<Objective>,
    pub required_items: Vec<RequiredItem>,
    /// Set when the prerequisite field could not be decoded and the quest
    /// was loaded without prerequisites.
    #[serde(default)]
    pub prerequisites_malformed: bool,
}

impl Quest {
    /// Create a goal-relevant level 1 quest with no prerequisites.
    pub fn new(id: impl Into<QuestId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level_requirement: 1,
            prerequisites: Vec::new(),
            map: None,
            trader: String::new(),
            goal_relevant: true,
            objectives: Vec::new(),
            required_items: Vec::new(),
            prerequisites_malformed: false,
        }
    }

    /// Set the level requirement (clamped to at least 1).
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level_requirement = level.max(1);
        self
    }

    /// Append prerequisite quest ids.
    #[must_use]
    pub fn with_prerequisites<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<QuestId>,
    {
        self.prerequisites.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }

    #[must_use]
    pub fn with_trader(mut self, trader: impl Into<String>) -> Self {
        self.trader = trader.into();
        self
    }

    #[must_use]
    pub fn with_goal_relevant(mut self, goal_relevant: bool) -> Self {
        self.goal_relevant = goal_relevant;
        self
    }

    /// Group key for the given grouping dimension.
    #[must_use]
    pub fn group_key(&self, by: GroupBy) -> &str {
        match by {
            GroupBy::Map => self
                .map
                .as_deref()
                .filter(|map| !map.trim().is_empty())
                .unwrap_or(ANY_MAP),
            GroupBy::Trader => &self.trader,
        }
    }

    /// Whether this quest falls in the group named `key`.
    #[must_use]
    pub fn in_group(&self, by: GroupBy, key: &str) -> bool {
        same_group(self.group_key(by), key)
    }

    /// Whether `id` appears in this quest's prerequisite list.
    #[must_use]
    pub fn requires(&self, id: &QuestId) -> bool {
        self.prerequisites.contains(id)
    }
}

/// Group keys compare trimmed and ASCII case-insensitively.
#[must_use]
pub fn same_group(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_quest_defaults() {
        let quest = Quest::new("debut", "Debut");
        assert_eq!(quest.level_requirement, 1);
        assert!(quest.prerequisites.is_empty());
        assert!(quest.goal_relevant);
        assert!(!quest.prerequisites_malformed);
    }

    #[test]
    fn level_is_clamped_to_one() {
        let quest = Quest::new("q", "Q").with_level(0);
        assert_eq!(quest.level_requirement, 1);
    }

    #[test]
    fn group_key_by_map_and_trader() {
        let quest = Quest::new("q", "Q")
            .with_map("Customs")
            .with_trader("Prapor");
        assert_eq!(quest.group_key(GroupBy::Map), "Customs");
        assert_eq!(quest.group_key(GroupBy::Trader), "Prapor");
    }

    #[test]
    fn quest_without_map_groups_under_any() {
        let quest = Quest::new("q", "Q");
        assert_eq!(quest.group_key(GroupBy::Map), ANY_MAP);

        let blank = Quest::new("q", "Q").with_map("  ");
        assert_eq!(blank.group_key(GroupBy::Map), ANY_MAP);
    }

    #[test]
    fn group_membership_ignores_case_and_padding() {
        let quest = Quest::new("q", "Q").with_map("Customs");
        assert!(quest.in_group(GroupBy::Map, "customs"));
        assert!(quest.in_group(GroupBy::Map, " CUSTOMS "));
        assert!(!quest.in_group(GroupBy::Map, "Woods"));
        assert!(Quest::new("r", "R").in_group(GroupBy::Map, "any"));
    }

    #[test]
    fn requires_checks_prerequisite_list() {
        let quest = Quest::new("b", "B").with_prerequisites(["a"]);
        assert!(quest.requires(&QuestId::from("a")));
        assert!(!quest.requires(&QuestId::from("c")));
    }
}
