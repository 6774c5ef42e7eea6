//! Handlers for commands that change progress: `complete`, `uncomplete`,
//! `level`, `reset` and `sync`.

use std::time::Instant;

use dialoguer::Confirm;
use serde_json::json;

use super::command::{LevelArgs, ResetArgs, ToggleArgs};
use super::{context, output};
use crate::application::tracker::Reconciled;
use crate::application::{SaveOutcome, SyncReport, SyncStatus};
use crate::domain::{QuestId, Transition};
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::PendingSaveQueue;

/// Which way a toggle command goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Complete,
    Uncomplete,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Self::Complete => "completed",
            Self::Uncomplete => "not completed",
        }
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if output::is_json() {
        return Err(ConfigError::InvalidValue {
            field: "yes",
            reason: "confirmation prompts are disabled with --json; pass --yes".to_string(),
        }
        .into());
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Execute `complete` or `uncomplete`.
///
/// The first press arms the quest; confirming the prompt is the second
/// press. A prompt answered after the confirmation window leaves the quest
/// unchanged.
///
/// # Errors
///
/// Returns an error for unknown quests, a failed prompt, or a save that
/// could neither be delivered nor queued.
pub async fn execute_toggle(config: &Config, args: ToggleArgs, direction: Direction) -> Result<()> {
    let (_services, mut session) =
        context::open_session(config, bootstrap::default_view(config)).await?;
    let id = QuestId::new(args.quest);

    let quest_name = session
        .tracker()
        .catalog()
        .get(&id)
        .map(|quest| quest.name.clone())
        .unwrap_or_else(|| id.to_string());
    let completed = session.tracker().state().is_completed(&id);
    if completed == (direction == Direction::Complete) && session.tracker().catalog().contains(&id) {
        output::note(&format!("{quest_name} is already {}.", direction.verb()));
        return Ok(());
    }

    if session.press(&id, Instant::now()).await?.is_some() {
        // The gate never confirms on a first press.
        return Ok(());
    }
    let window = config.tracker.confirm_window();
    let prompt = format!(
        "Mark {quest_name} as {}? (confirm within {}s)",
        direction.verb(),
        window.as_secs()
    );
    if !confirm(&prompt, args.yes)? {
        output::note("Cancelled.");
        return Ok(());
    }

    match session.press(&id, Instant::now()).await? {
        Some(report) => {
            render_report(&report, &quest_name);
            if direction == Direction::Complete {
                show_newly_open(&session, &id);
            }
        }
        None => output::warning("Confirmation window expired; nothing changed."),
    }
    Ok(())
}

fn show_newly_open(session: &crate::application::Session, id: &QuestId) {
    if output::is_json() || output::is_quiet() {
        return;
    }
    let tracker = session.tracker();
    let Ok(dependents) = tracker.unlocks(id) else {
        return;
    };
    let open: Vec<&str> = dependents
        .iter()
        .filter(|quest| matches!(tracker.lock_reason(&quest.id), Ok(None)))
        .filter(|quest| !tracker.state().is_completed(&quest.id))
        .map(|quest| quest.name.as_str())
        .collect();
    if !open.is_empty() {
        output::field("Now open", open.join(", "));
    }
}

/// Execute `level <n>`.
///
/// # Errors
///
/// Returns an error for level 0 or if loading fails.
pub async fn execute_level(config: &Config, args: LevelArgs) -> Result<()> {
    let (_services, mut session) =
        context::open_session(config, bootstrap::default_view(config)).await?;
    let before = session.tracker().view().entries.len();
    let report = session.set_level(args.level).await?;
    let after = session.tracker().view().entries.len();

    render_report(&report, &format!("Level {}", args.level));
    if after > before && !output::is_json() {
        output::note(&format!("{} more quests available.", after - before));
    }
    Ok(())
}

/// Execute `reset`.
///
/// # Errors
///
/// Returns an error if the store rejects the reset.
pub async fn execute_reset(config: &Config, args: ResetArgs) -> Result<()> {
    let (_services, mut session) =
        context::open_session(config, bootstrap::default_view(config)).await?;

    if !confirm("Reset all progress to level 1 with nothing completed?", args.yes)? {
        output::note("Cancelled.");
        return Ok(());
    }
    session.reset().await?;

    if output::is_json() {
        output::json_output(json!({ "command": "reset", "status": "ok" }));
    } else {
        output::success("Progress reset");
    }
    Ok(())
}

/// Execute `sync`.
///
/// # Errors
///
/// Returns the store error when the health probe fails.
pub async fn execute_sync(config: &Config) -> Result<()> {
    let services = bootstrap::build_services(config)?;
    let queued = services.queue.len().await?;

    let pb = output::spinner("Checking store");
    let result = services.saves.health_check().await;
    output::spinner_clear(&pb);

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if queued > 0 {
                output::warning(&format!("{queued} saves still queued"));
            }
            return Err(e);
        }
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "sync",
            "queued_before": queued,
            "outcome": match &outcome {
                None => "idle",
                Some(SaveOutcome::Committed(_)) => "delivered",
                Some(SaveOutcome::Coalesced) => "coalesced",
                Some(SaveOutcome::Queued { .. }) => "queued",
            },
        }));
        return Ok(());
    }

    output::success("Store reachable");
    match outcome {
        None => output::note("No queued saves."),
        Some(SaveOutcome::Committed(receipt)) => match &receipt.completed {
            Some(completed) => output::success(&format!(
                "Delivered queued save ({} quests completed)",
                completed.len()
            )),
            None => output::success("Delivered queued save"),
        },
        Some(SaveOutcome::Coalesced) => output::note("A save is already in flight."),
        Some(SaveOutcome::Queued { error, .. }) => {
            output::warning(&format!("Queued save still not delivered: {error}"));
        }
    }
    Ok(())
}

/// Print what happened to one mutation.
pub fn render_report(report: &SyncReport, subject: &str) {
    if output::is_json() {
        output::json_output(json!({
            "revision": report.revision,
            "transition": report.transition,
            "status": status_json(&report.status),
        }));
        return;
    }

    match report.transition {
        Some(Transition::Completed) => output::success(&format!("{subject} marked completed")),
        Some(Transition::Uncompleted) => output::success(&format!("{subject} marked not completed")),
        None => output::success(subject),
    }

    match &report.status {
        SyncStatus::Saved {
            reconciled,
            summary,
        } => {
            if let Reconciled::Applied { added, removed } = reconciled {
                if !added.is_empty() {
                    output::field("Also done", join(added));
                }
                if !removed.is_empty() {
                    output::field("Undone", join(removed));
                }
            }
            output::field(
                "Overall",
                format!(
                    "{} completed ({:.1}%)",
                    summary.total_completed, summary.completion_rate
                ),
            );
        }
        SyncStatus::Coalesced => output::note("Saving after the previous save finishes."),
        SyncStatus::Queued { error, .. } => output::warning(&format!(
            "Could not reach the store ({error}); saved locally and queued. Run `questboard sync` later."
        )),
    }
}

fn status_json(status: &SyncStatus) -> serde_json::Value {
    match status {
        SyncStatus::Saved {
            reconciled,
            summary,
        } => {
            let (added, removed) = match reconciled {
                Reconciled::Applied { added, removed } => (added.clone(), removed.clone()),
                Reconciled::Stale { .. } | Reconciled::Kept => (Vec::new(), Vec::new()),
            };
            json!({
                "state": "saved",
                "added": added,
                "removed": removed,
                "summary": summary,
            })
        }
        SyncStatus::Coalesced => json!({ "state": "coalesced" }),
        SyncStatus::Queued { attempts, error } => json!({
            "state": "queued",
            "attempts": attempts,
            "error": error,
        }),
    }
}

fn join(ids: &[QuestId]) -> String {
    ids.iter().map(QuestId::as_str).collect::<Vec<_>>().join(", ")
}
