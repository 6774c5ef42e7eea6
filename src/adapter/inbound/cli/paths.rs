//! Path utilities for questboard.
//!
//! All local data lives under `~/.questboard/`:
//! - `~/.questboard/config.toml` - main configuration
//! - `~/.questboard/questboard.db` - queue of undelivered saves

use std::path::PathBuf;

/// Returns the questboard home directory (`~/.questboard/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".questboard")
}

/// Returns the default config file path (`~/.questboard/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default queue database path (`~/.questboard/questboard.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("questboard.db")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_questboard_home() {
        assert!(home_dir().ends_with(".questboard"));
        assert!(default_config().starts_with(home_dir()));
        assert!(default_database().starts_with(home_dir()));
    }

    #[test]
    fn expand_home_only_touches_tilde_prefix() {
        assert_eq!(expand_home("/tmp/q.db"), PathBuf::from("/tmp/q.db"));
        assert_eq!(expand_home("q.db"), PathBuf::from("q.db"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/q.db"), home.join("q.db"));
        }
    }
}
