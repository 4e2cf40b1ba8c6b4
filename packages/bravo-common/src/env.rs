//! Environment-backed configuration helpers.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Reads `key` and parses it, falling back to `default` when unset.
pub fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }
        }),
        Err(_) => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Like [`try_load`] for durations expressed in milliseconds.
pub fn try_load_millis(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    try_load(key, default.as_millis() as u64).map(Duration::from_millis)
}
