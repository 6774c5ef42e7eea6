//! Composition root: builds adapters and services from configuration.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::outbound::http::HttpStore;
use crate::adapter::outbound::sqlite::database::connection;
use crate::adapter::outbound::sqlite::SqliteSaveQueue;
use crate::application::{RetryPolicy, SaveCoordinator, Session};
use crate::domain::{GroupSelector, ViewConfig};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::PendingSaveQueue;

/// Wired services for one CLI invocation.
pub struct Services {
    pub store: Arc<HttpStore>,
    pub queue: Arc<dyn PendingSaveQueue>,
    pub saves: Arc<SaveCoordinator>,
}

/// Build the HTTP client, open the queue database and the save coordinator.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the queue
/// database cannot be opened or migrated.
pub fn build_services(config: &Config) -> Result<Services> {
    let store = Arc::new(HttpStore::new(&config.store)?);

    if let Some(parent) = Path::new(&config.database).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let pool = connection::open(&config.database)?;
    debug!(database = %config.database, "Save queue opened");
    let queue: Arc<dyn PendingSaveQueue> = Arc::new(SqliteSaveQueue::new(pool));

    let saves = Arc::new(SaveCoordinator::new(
        store.clone(),
        queue.clone(),
        RetryPolicy::from_config(&config.retry),
    ));

    info!(base_url = %store.base_url(), "Services ready");
    Ok(Services {
        store,
        queue,
        saves,
    })
}

/// Initial view selection from configuration.
#[must_use]
pub fn default_view(config: &Config) -> ViewConfig {
    ViewConfig {
        group_by: config.tracker.group_by,
        group: GroupSelector::All,
        ..ViewConfig::default()
    }
}

/// Open a session: fetch the catalog, deliver queued saves, load progress.
///
/// # Errors
///
/// See [`Session::open`].
pub async fn open_session(config: &Config, services: &Services, view: ViewConfig) -> Result<Session> {
    Session::open(
        services.store.as_ref(),
        services.saves.clone(),
        view,
        config.tracker.confirm_window(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroupBy;
    use crate::testkit::config::config;

    #[test]
    fn build_services_creates_queue_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.db");
        let config = config("http://127.0.0.1:9", path.to_str().unwrap());

        let services = build_services(&config).unwrap();

        assert!(path.exists());
        assert!(!services.saves.is_pending());
    }

    #[test]
    fn default_view_follows_tracker_config() {
        let mut config = Config::default();
        config.tracker.group_by = GroupBy::Trader;
        let view = default_view(&config);
        assert_eq!(view.group_by, GroupBy::Trader);
        assert_eq!(view.group, GroupSelector::All);
    }
}
