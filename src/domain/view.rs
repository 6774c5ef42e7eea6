//! Derived view types.
//!
//! Everything here is recomputed from `(catalog, state, config)` on each
//! render and never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::QuestId;
use super::quest::{GroupBy, Quest};

/// Label of the pseudo-group that spans every quest.
pub const ALL_GROUP: &str = "All";

/// Which slice of the goal-relevant quests to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Unlocked and not completed.
    #[default]
    Available,
    /// Not completed, locked or not, with lock reasons attached.
    #[serde(alias = "future")]
    Preview,
    /// Completed.
    Finished,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Preview => f.write_str("preview"),
            Self::Finished => f.write_str("finished"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "preview" | "future" => Ok(Self::Preview),
            "finished" => Ok(Self::Finished),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

/// Active group tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSelector {
    /// No group restriction.
    #[default]
    All,
    /// Quests whose group key equals this value.
    Key(String),
}

impl GroupSelector {
    /// Build a selector from a user-supplied name; `"All"` selects everything.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(ALL_GROUP) {
            Self::All
        } else {
            Self::Key(name.to_string())
        }
    }

    #[must_use]
    pub fn contains(&self, quest: &Quest, by: GroupBy) -> bool {
        match self {
            Self::All => true,
            Self::Key(key) => quest.in_group(by, key),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::All => ALL_GROUP,
            Self::Key(key) => key,
        }
    }
}

impl fmt::Display for GroupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordering of classified quests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestOrder {
    /// Catalog order, unchanged.
    #[default]
    Catalog,
    /// Ascending level requirement, catalog order within a level.
    Level,
}

/// Everything that selects what the board shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub group_by: GroupBy,
    pub group: GroupSelector,
    pub mode: ViewMode,
    pub order: QuestOrder,
}

/// Why a quest is locked.
///
/// The level gate and the prerequisite gate are reported independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockReason {
    pub missing_level: bool,
    pub required_level: u32,
    /// Uncompleted prerequisites known to the catalog, in catalog order.
    pub missing_prerequisites: Vec<QuestId>,
    /// Uncompleted prerequisite ids the catalog does not know. These can
    /// never be satisfied from the catalog and keep the quest locked.
    pub unresolved_prerequisites: Vec<QuestId>,
}

impl LockReason {
    /// Whether anything other than the level is blocking.
    #[must_use]
    pub fn has_prerequisite_gate(&self) -> bool {
        !self.missing_prerequisites.is_empty() || !self.unresolved_prerequisites.is_empty()
    }
}

/// Per-group quest counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    /// Goal-relevant quests in the group.
    pub total: usize,
    /// Of those, completed.
    pub completed: usize,
    /// Mode-dependent count shown on the tab.
    pub available: usize,
}

/// A group tab with its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTab {
    pub group: GroupSelector,
    pub stats: GroupStats,
}

impl GroupTab {
    /// Tab label, e.g. `Customs (3) 5/12`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} ({}) {}/{}",
            self.group.name(),
            self.stats.available,
            self.stats.completed,
            self.stats.total
        )
    }
}

impl fmt::Display for GroupTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One quest on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestEntry<'a> {
    pub quest: &'a Quest,
    /// Present for locked quests in preview mode.
    pub lock: Option<LockReason>,
    /// Quests that list this one as a prerequisite.
    pub unlocks: Vec<&'a QuestId>,
}

/// The full derived board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView<'a> {
    pub config: ViewConfig,
    pub entries: Vec<QuestEntry<'a>>,
    pub tabs: Vec<GroupTab>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_mode_parses_future_alias() {
        assert_eq!("future".parse::<ViewMode>(), Ok(ViewMode::Preview));
        assert_eq!("Finished".parse::<ViewMode>(), Ok(ViewMode::Finished));
        assert!("done".parse::<ViewMode>().is_err());
    }

    #[test]
    fn group_selector_parse() {
        assert_eq!(GroupSelector::parse("all"), GroupSelector::All);
        assert_eq!(GroupSelector::parse(""), GroupSelector::All);
        assert_eq!(
            GroupSelector::parse(" Customs "),
            GroupSelector::Key("Customs".into())
        );
    }

    #[test]
    fn group_selector_matching_ignores_case() {
        let quest = Quest::new("q", "Q").with_map("Customs");
        assert!(GroupSelector::parse("customs").contains(&quest, GroupBy::Map));
        assert!(!GroupSelector::parse("Woods").contains(&quest, GroupBy::Map));
        assert!(GroupSelector::All.contains(&quest, GroupBy::Trader));
    }

    #[test]
    fn tab_label_format() {
        let tab = GroupTab {
            group: GroupSelector::Key("Customs".into()),
            stats: GroupStats {
                total: 12,
                completed: 5,
                available: 3,
            },
        };
        assert_eq!(tab.label(), "Customs (3) 5/12");
    }
}
