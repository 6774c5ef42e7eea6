//! Quest availability engine.
//!
//! Pure functions over `(catalog, state)`. Nothing is cached: every call
//! scans the catalog, which is cheap at catalog scale and keeps the view
//! free of hidden state.
//!
//! Two leniency rules meet here. A prerequisite list that failed to decode
//! is loaded as empty, so the quest is gated by level only (fail open). A
//! prerequisite id the catalog does not know still has to be completed, so
//! the quest stays locked, but it is never reported by
//! [`missing_prerequisites`]; [`lock_reason`] lists it separately as
//! unresolved.
//!
//! # Example
//!
//! ```
//! use questboard::domain::availability::{classify, unlocks_if_completed};
//! use questboard::domain::catalog::QuestCatalog;
//! use questboard::domain::progress::UserState;
//! use questboard::domain::quest::{GroupBy, Quest};
//! use questboard::domain::view::{GroupSelector, ViewMode};
//!
//! let catalog = QuestCatalog::from_quests([
//!     Quest::new("a", "A").with_map("Customs"),
//!     Quest::new("b", "B").with_map("Customs").with_prerequisites(["a"]),
//! ]);
//! let state = UserState::new(1).unwrap();
//!
//! let available = classify(&catalog, &state, GroupBy::Map, &GroupSelector::All, ViewMode::Available);
//! assert_eq!(available.len(), 1);
//! assert_eq!(unlocks_if_completed(&"a".into(), &catalog)[0].name, "B");
//! ```

use std::collections::HashMap;

use super::catalog::QuestCatalog;
use super::id::QuestId;
use super::progress::UserState;
use super::quest::{GroupBy, Quest};
use super::view::{
    BoardView, GroupSelector, GroupStats, GroupTab, LockReason, QuestEntry, QuestOrder,
    ViewConfig, ViewMode,
};

/// Whether the quest's level and prerequisite gates are both satisfied.
#[must_use]
pub fn is_unlocked(quest: &Quest, state: &UserState) -> bool {
    if state.level() < quest.level_requirement {
        return false;
    }
    quest
        .prerequisites
        .iter()
        .all(|id| state.is_completed(id))
}

/// Uncompleted prerequisites of `quest`, in catalog order.
///
/// Ids unknown to the catalog are skipped.
#[must_use]
pub fn missing_prerequisites<'a>(
    quest: &Quest,
    catalog: &'a QuestCatalog,
    state: &UserState,
) -> Vec<&'a Quest> {
    let mut positions: Vec<usize> = quest
        .prerequisites
        .iter()
        .filter(|id| !state.is_completed(id))
        .filter_map(|id| catalog.position(id))
        .collect();
    positions.sort_unstable();
    positions.dedup();
    positions
        .into_iter()
        .map(|position| &catalog.quests()[position])
        .collect()
}

/// Explain why a quest is locked, or `None` if it is unlocked.
#[must_use]
pub fn lock_reason(quest: &Quest, catalog: &QuestCatalog, state: &UserState) -> Option<LockReason> {
    if is_unlocked(quest, state) {
        return None;
    }

    let missing_prerequisites = missing_prerequisites(quest, catalog, state)
        .into_iter()
        .map(|prerequisite| prerequisite.id.clone())
        .collect();

    let mut unresolved_prerequisites: Vec<QuestId> = Vec::new();
    for id in &quest.prerequisites {
        if !catalog.contains(id) && !state.is_completed(id) && !unresolved_prerequisites.contains(id)
        {
            unresolved_prerequisites.push(id.clone());
        }
    }

    Some(LockReason {
        missing_level: state.level() < quest.level_requirement,
        required_level: quest.level_requirement,
        missing_prerequisites,
        unresolved_prerequisites,
    })
}

/// Whether a quest belongs in the given mode, ignoring grouping.
#[must_use]
pub fn matches_mode(quest: &Quest, state: &UserState, mode: ViewMode) -> bool {
    if !quest.goal_relevant {
        return false;
    }
    let completed = state.is_completed(&quest.id);
    match mode {
        ViewMode::Available => !completed && is_unlocked(quest, state),
        ViewMode::Preview => !completed,
        ViewMode::Finished => completed,
    }
}

/// Quests of one group matching `mode`, in catalog order.
#[must_use]
pub fn classify<'a>(
    catalog: &'a QuestCatalog,
    state: &UserState,
    group_by: GroupBy,
    group: &GroupSelector,
    mode: ViewMode,
) -> Vec<&'a Quest> {
    catalog
        .iter()
        .filter(|quest| group.contains(quest, group_by))
        .filter(|quest| matches_mode(quest, state, mode))
        .collect()
}

/// Reorder by ascending level requirement; ties keep their existing order.
pub fn sort_by_level(quests: &mut [&Quest]) {
    quests.sort_by_key(|quest| quest.level_requirement);
}

/// Quests that list `id` among their prerequisites.
#[must_use]
pub fn unlocks_if_completed<'a>(id: &QuestId, catalog: &'a QuestCatalog) -> Vec<&'a Quest> {
    catalog.iter().filter(|quest| quest.requires(id)).collect()
}

/// Counts for one group under `mode`.
#[must_use]
pub fn group_statistics(
    group_by: GroupBy,
    group: &GroupSelector,
    catalog: &QuestCatalog,
    state: &UserState,
    mode: ViewMode,
) -> GroupStats {
    let mut stats = GroupStats::default();
    let mut unlocked_open = 0;

    for quest in catalog
        .iter()
        .filter(|quest| quest.goal_relevant && group.contains(quest, group_by))
    {
        stats.total += 1;
        if state.is_completed(&quest.id) {
            stats.completed += 1;
        } else if is_unlocked(quest, state) {
            unlocked_open += 1;
        }
    }

    stats.available = match mode {
        ViewMode::Finished => stats.completed,
        ViewMode::Preview => stats.total - stats.completed,
        ViewMode::Available => unlocked_open,
    };
    stats
}

/// Group tabs ranked by descending available count.
///
/// The `All` tab is always first. Groups without goal-relevant quests are
/// omitted; ties keep first-appearance order.
#[must_use]
pub fn group_tabs(
    catalog: &QuestCatalog,
    state: &UserState,
    group_by: GroupBy,
    mode: ViewMode,
) -> Vec<GroupTab> {
    let mut ranked: Vec<GroupTab> = catalog
        .groups(group_by)
        .into_iter()
        .map(|key| {
            let group = GroupSelector::Key(key.to_string());
            let stats = group_statistics(group_by, &group, catalog, state, mode);
            GroupTab { group, stats }
        })
        .filter(|tab| tab.stats.total > 0)
        .collect();
    ranked.sort_by(|a, b| b.stats.available.cmp(&a.stats.available));

    let all = GroupTab {
        group: GroupSelector::All,
        stats: group_statistics(group_by, &GroupSelector::All, catalog, state, mode),
    };

    let mut tabs = Vec::with_capacity(ranked.len() + 1);
    tabs.push(all);
    tabs.extend(ranked);
    tabs
}

/// Derive the whole board for one render pass.
#[must_use]
pub fn derive_view<'a>(
    catalog: &'a QuestCatalog,
    state: &UserState,
    config: &ViewConfig,
) -> BoardView<'a> {
    let mut quests = classify(catalog, state, config.group_by, &config.group, config.mode);
    if config.order == QuestOrder::Level {
        sort_by_level(&mut quests);
    }

    let mut dependents: HashMap<&QuestId, Vec<&'a QuestId>> = HashMap::new();
    for quest in catalog.iter() {
        for prerequisite in &quest.prerequisites {
            let unlocked = dependents.entry(prerequisite).or_default();
            if !unlocked.contains(&&quest.id) {
                unlocked.push(&quest.id);
            }
        }
    }

    let entries = quests
        .into_iter()
        .map(|quest| QuestEntry {
            quest,
            lock: match config.mode {
                ViewMode::Preview => lock_reason(quest, catalog, state),
                ViewMode::Available | ViewMode::Finished => None,
            },
            unlocks: dependents.get(&quest.id).cloned().unwrap_or_default(),
        })
        .collect();

    BoardView {
        config: config.clone(),
        entries,
        tabs: group_tabs(catalog, state, config.group_by, config.mode),
    }
}
