//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::infrastructure::config::retry::RetryConfig;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::store::StoreConfig;

/// Retry config with millisecond delays and no jitter.
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 1,
        max_delay_ms: 4,
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

/// Store config pointing at `base_url` with a short timeout.
pub fn store(base_url: &str) -> StoreConfig {
    StoreConfig {
        base_url: base_url.to_string(),
        request_timeout_ms: 500,
        api_token: None,
    }
}

/// Full config with the queue database at `database`.
pub fn config(base_url: &str, database: &str) -> Config {
    Config {
        database: database.to_string(),
        store: store(base_url),
        retry: fast_retry(2),
        ..Config::default()
    }
}
