//! Handlers for `quests`, `groups` and `unlocks`.

use serde_json::json;
use tabled::{Table, Tabled};

use super::command::{GroupByArg, GroupsArgs, QuestArg, QuestsArgs};
use super::context;
use super::output;
use crate::domain::availability::is_unlocked;
use crate::domain::item::ItemCategory;
use crate::domain::view::QuestEntry;
use crate::domain::{GroupBy, GroupSelector, LockReason, QuestId, ViewConfig};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

#[derive(Tabled)]
struct QuestRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Quest")]
    name: String,
    #[tabled(rename = "Lvl")]
    level: u32,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Unlocks")]
    unlocks: usize,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Shown")]
    available: usize,
    #[tabled(rename = "Progress")]
    progress: String,
}

/// Short text for why a quest is locked.
#[must_use]
pub fn describe_lock(reason: &LockReason) -> String {
    let mut parts = Vec::new();
    if reason.missing_level {
        parts.push(format!("level {}", reason.required_level));
    }
    if !reason.missing_prerequisites.is_empty() {
        parts.push(format!("needs {}", join_ids(&reason.missing_prerequisites)));
    }
    if !reason.unresolved_prerequisites.is_empty() {
        parts.push(format!(
            "unknown prerequisite {}",
            join_ids(&reason.unresolved_prerequisites)
        ));
    }
    parts.join("; ")
}

fn join_ids(ids: &[QuestId]) -> String {
    ids.iter()
        .map(QuestId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn status_cell(entry: &QuestEntry<'_>, completed: bool) -> String {
    if completed {
        return output::positive("done");
    }
    match &entry.lock {
        Some(reason) => output::caution(describe_lock(reason)),
        None if entry.quest.prerequisites_malformed => output::caution("open (prerequisites unreadable)"),
        None => output::highlight("open"),
    }
}

fn group_by_or_default(config: &Config, arg: Option<GroupByArg>) -> GroupBy {
    arg.map_or(config.tracker.group_by, GroupBy::from)
}

/// Execute `quests`.
///
/// # Errors
///
/// Returns an error if the catalog or progress cannot be loaded.
pub async fn execute_quests(config: &Config, args: QuestsArgs) -> Result<()> {
    let view = ViewConfig {
        group_by: group_by_or_default(config, args.group_by),
        group: GroupSelector::parse(&args.group),
        mode: args.mode.into(),
        order: args.order.into(),
    };
    let (_services, session) = context::open_session(config, view).await?;
    let tracker = session.tracker();
    let board = tracker.view();

    if output::is_json() {
        output::json_output(json!({
            "command": "quests",
            "level": tracker.state().level(),
            "board": serde_json::to_value(&board)?,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Level", tracker.state().level());
    output::field("View", format!("{} / {}", board.config.group, board.config.mode));
    output::lines(
        &board
            .tabs
            .iter()
            .map(|tab| {
                if tab.group == board.config.group {
                    output::highlight(tab.label())
                } else {
                    output::muted(tab.label())
                }
            })
            .collect::<Vec<_>>()
            .join("  "),
    );

    output::section("Quests");
    if board.entries.is_empty() {
        output::note("Nothing to show in this view.");
        return Ok(());
    }

    let rows: Vec<QuestRow> = board
        .entries
        .iter()
        .map(|entry| QuestRow {
            id: entry.quest.id.to_string(),
            name: entry.quest.name.clone(),
            level: entry.quest.level_requirement,
            group: entry.quest.group_key(board.config.group_by).to_string(),
            unlocks: entry.unlocks.len(),
            status: status_cell(entry, tracker.state().is_completed(&entry.quest.id)),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());

    if args.items {
        output::section("Required items");
        for entry in &board.entries {
            for item in &entry.quest.required_items {
                let category: ItemCategory = item.category();
                output::field(
                    &category.to_string(),
                    format!(
                        "{} x{}{}  ({})",
                        item.name,
                        item.count,
                        if item.found_in_raid { " FIR" } else { "" },
                        entry.quest.name
                    ),
                );
            }
        }
    }
    Ok(())
}

/// Execute `groups`.
///
/// # Errors
///
/// Returns an error if the catalog or progress cannot be loaded.
pub async fn execute_groups(config: &Config, args: GroupsArgs) -> Result<()> {
    let view = ViewConfig {
        group_by: group_by_or_default(config, args.group_by),
        mode: args.mode.into(),
        ..bootstrap::default_view(config)
    };
    let (_services, session) = context::open_session(config, view).await?;
    let board = session.tracker().view();

    if output::is_json() {
        output::json_output(json!({
            "command": "groups",
            "group_by": board.config.group_by,
            "mode": board.config.mode,
            "tabs": board.tabs.iter().map(|tab| json!({
                "group": tab.group.name(),
                "label": tab.label(),
                "stats": tab.stats,
            })).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(&format!("Groups by {} ({})", board.config.group_by, board.config.mode));
    let rows: Vec<GroupRow> = board
        .tabs
        .iter()
        .map(|tab| GroupRow {
            group: tab.group.name().to_string(),
            available: tab.stats.available,
            progress: output::progress_bar(tab.stats.completed, tab.stats.total),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

/// Execute `unlocks <id>`.
///
/// # Errors
///
/// Returns an error for unknown quests or if loading fails.
pub async fn execute_unlocks(config: &Config, args: QuestArg) -> Result<()> {
    let (_services, session) = context::open_session(config, bootstrap::default_view(config)).await?;
    let tracker = session.tracker();
    let id = QuestId::new(args.quest);
    let dependents = tracker.unlocks(&id)?;

    let mut after = tracker.state().clone();
    after.complete(id.clone());
    let opened: Vec<bool> = dependents
        .iter()
        .map(|quest| !after.is_completed(&quest.id) && is_unlocked(quest, &after))
        .collect();

    if output::is_json() {
        output::json_output(json!({
            "command": "unlocks",
            "quest": id,
            "unlocks": dependents.iter().zip(&opened).map(|(quest, opens)| json!({
                "id": quest.id,
                "name": quest.name,
                "opens_now": opens,
            })).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::section(&format!("Completing {id} unlocks"));
    if dependents.is_empty() {
        output::note("No quest depends on it.");
        return Ok(());
    }
    for (quest, opens) in dependents.iter().zip(&opened) {
        let marker = if *opens {
            output::positive("opens")
        } else {
            output::muted("still locked")
        };
        output::field(quest.id.as_str(), format!("{}  {marker}", quest.name));
    }
    Ok(())
}
