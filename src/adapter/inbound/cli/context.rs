//! Per-invocation setup shared by the command handlers.

use std::path::Path;

use tracing::debug;

use super::{output, paths};
use crate::application::Session;
use crate::domain::ViewConfig;
use crate::error::Result;
use crate::infrastructure::bootstrap::{self, Services};
use crate::infrastructure::config::settings::Config;

/// Load the config file, or defaults when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or
/// validated.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let mut config = Config::load(path)?;
        config.database = paths::expand_home(&config.database).display().to_string();
        return Ok(config);
    }
    debug!(path = %path.display(), "No config file, using defaults");
    let mut config = Config::parse_toml("")?;
    config.database = paths::default_database().display().to_string();
    Ok(config)
}

/// Open services and a session, with a spinner while the network is busy.
///
/// # Errors
///
/// Returns an error if wiring fails or the session cannot be opened.
pub async fn open_session(config: &Config, view: ViewConfig) -> Result<(Services, Session)> {
    let services = bootstrap::build_services(config)?;
    let pb = output::spinner("Loading quests");
    let session = bootstrap::open_session(config, &services, view).await;
    output::spinner_clear(&pb);
    let session = session?;

    let issues = session.issues();
    if !issues.is_empty() {
        if output::verbosity() > 0 {
            for issue in issues {
                output::warning(&issue.to_string());
            }
        } else {
            output::note(&format!(
                "{} catalog entries were repaired while loading (use -v for details)",
                issues.len()
            ));
        }
    }
    Ok((services, session))
}
