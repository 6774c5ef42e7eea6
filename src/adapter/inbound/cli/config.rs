//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use miette::Report;
use serde_json::json;

use super::diagnostic::ConfigDiagnostic;
use super::{context, output};
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::store::API_TOKEN_ENV;

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute `config init`.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is not set, or if it
/// cannot be written.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    output::section("Config Initialized");
    output::success("Created configuration file");
    output::field("Path", path.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your tracker URL", path.display()));
    output::note(&format!("2. Set the {API_TOKEN_ENV} environment variable"));
    output::note(&format!(
        "3. Run: questboard config validate -c {}",
        path.display()
    ));
    output::note("4. Run: questboard quests");
    Ok(())
}

/// Execute `config show`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = context::load_config(path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "config show",
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": serde_json::to_value(&config)?,
            "token_loaded": config.store.api_token.is_some(),
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("File", path.display());
    if !path.exists() {
        output::note("(file not found, showing defaults)");
    }
    output::field("Database", &config.database);

    output::section("Store");
    output::field("URL", &config.store.base_url);
    output::field("Timeout", format!("{}ms", config.store.request_timeout_ms));
    if config.store.api_token.is_some() {
        output::success(&format!("Token loaded from {API_TOKEN_ENV}"));
    } else {
        output::warning(&format!("Token not set ({API_TOKEN_ENV})"));
    }

    output::section("Retry");
    output::field("Attempts", config.retry.max_attempts);
    output::field(
        "Backoff",
        format!(
            "{}ms to {}ms, x{}",
            config.retry.initial_delay_ms, config.retry.max_delay_ms, config.retry.backoff_multiplier
        ),
    );
    output::field("Jitter", if config.retry.jitter { "yes" } else { "no" });

    output::section("Tracker");
    output::field("Group by", config.tracker.group_by);
    output::field("Confirm", format!("{}ms", config.tracker.confirm_window_ms));

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);
    Ok(())
}

/// Execute `config validate`.
///
/// TOML syntax errors are rendered with their source location before the
/// error is returned.
///
/// # Errors
///
/// Returns an error if the file is missing, malformed or invalid.
pub fn execute_validate(path: &Path) -> Result<()> {
    output::section("Config Validation");
    output::field("Path", path.display());

    let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
    match Config::parse_toml(&content) {
        Ok(config) => {
            output::success("Config file is valid");
            if config.store.api_token.is_none() {
                output::warning(&format!("{API_TOKEN_ENV} is not set"));
            }
            output::field(
                "Next",
                format!("questboard config show -c {}", path.display()),
            );
            Ok(())
        }
        Err(Error::Config(ConfigError::Parse(err))) => {
            if !output::is_json() {
                let diagnostic = ConfigDiagnostic::from_toml(&content, &err)
                    .with_help("check the TOML syntax near the marked location");
                eprintln!("{:?}", Report::new(diagnostic));
            }
            Err(ConfigError::Parse(err).into())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_template_parses_to_defaults() {
        let config = Config::parse_toml(CONFIG_TEMPLATE).unwrap();
        let defaults = Config::default();
        assert_eq!(config.store.base_url, defaults.store.base_url);
        assert_eq!(config.retry.max_attempts, defaults.retry.max_attempts);
        assert_eq!(
            config.tracker.confirm_window_ms,
            defaults.tracker.confirm_window_ms
        );
    }

    #[test]
    fn init_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        execute_init(&path, false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "# mine").unwrap();

        assert!(execute_init(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine");

        execute_init(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn validate_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute_validate(&dir.path().join("absent.toml"));
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }

    #[test]
    fn validate_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[store\nbase_url = 1").unwrap();

        assert!(matches!(
            execute_validate(&path),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn validate_surfaces_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

        assert!(matches!(
            execute_validate(&path),
            Err(Error::Config(ConfigError::InvalidValue {
                field: "max_attempts",
                ..
            }))
        ));
    }
}
