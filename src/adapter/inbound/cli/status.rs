//! Handler for the `status` command.

use serde_json::json;

use super::output;
use crate::domain::availability::group_statistics;
use crate::domain::{GroupBy, GroupSelector, QuestCatalog, UserState, ViewMode};
use crate::error::Result;
use crate::infrastructure::bootstrap::{self, Services};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::{PendingSaveQueue, ProgressStore, QuestCatalogSource};

struct StoreReport {
    reachable: std::result::Result<(), String>,
    progress: Option<(UserState, usize, usize)>,
}

async fn probe(services: &Services) -> StoreReport {
    let reachable = services.store.health().await.map_err(|e| e.to_string());
    if reachable.is_err() {
        return StoreReport {
            reachable,
            progress: None,
        };
    }

    let progress = match (services.store.load().await, services.store.fetch_quests().await) {
        (Ok(state), Ok(records)) => {
            let (catalog, _) = QuestCatalog::decode(records);
            let stats = group_statistics(
                GroupBy::Map,
                &GroupSelector::All,
                &catalog,
                &state,
                ViewMode::Available,
            );
            Some((state, stats.completed, stats.total))
        }
        _ => None,
    };
    StoreReport {
        reachable,
        progress,
    }
}

/// Execute the status command.
///
/// Store failures are reported, not returned.
///
/// # Errors
///
/// Returns an error if the local queue cannot be opened or read.
pub async fn execute(config: &Config) -> Result<()> {
    if output::is_quiet() && !output::is_json() {
        return Ok(());
    }

    let services = bootstrap::build_services(config)?;
    let queued = services.queue.len().await?;
    let latest = services.queue.latest().await?;

    let pb = output::spinner("Contacting store");
    let report = probe(&services).await;
    output::spinner_clear(&pb);

    if output::is_json() {
        output::json_output(json!({
            "command": "status",
            "store": services.store.base_url().as_str(),
            "reachable": report.reachable.is_ok(),
            "error": report.reachable.as_ref().err(),
            "queue": {
                "database": config.database,
                "length": queued,
                "latest_revision": latest.as_ref().map(|snapshot| snapshot.revision),
            },
            "progress": report.progress.as_ref().map(|(state, completed, total)| json!({
                "level": state.level(),
                "completed": state.completed().len(),
                "goal_completed": completed,
                "goal_total": total,
            })),
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Store", services.store.base_url());
    match &report.reachable {
        Ok(()) => output::success("Store reachable"),
        Err(e) => output::warning(&format!("Store unreachable: {e}")),
    }

    if let Some((state, completed, total)) = &report.progress {
        output::section("Progress");
        output::field("Level", state.level());
        output::field("Completed", state.completed().len());
        output::field("Goal", output::progress_bar(*completed, *total));
    }

    output::section("Save queue");
    output::field("Database", &config.database);
    if let Some(snapshot) = latest {
        output::field("Queued", queued);
        output::field("Latest", format!("revision {}", snapshot.revision));
        output::hint("run `questboard sync` to deliver queued saves");
    } else {
        output::note("Empty.");
    }
    Ok(())
}
