//! Engine configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "QUESTLINE_POLL_INTERVAL_MS";

/// Environment variable holding the tick budget per attempt.
pub const MAX_TICKS_ENV: &str = "QUESTLINE_MAX_TICKS";

/// Configuration loading errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be used.
    #[error("{key} must be {reason}, got {value:?}")]
    InvalidValue {
        /// The offending variable.
        key: &'static str,
        /// The raw value found.
        value: String,
        /// Why the value was rejected, phrased as what is required.
        reason: &'static str,
    },
}

/// Polling behaviour of the engine's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pause between two polls of the same attempt.
    pub poll_interval: Duration,
    /// Polls after which an unsettled attempt is reported as stalled.
    pub max_ticks: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_ticks: 10_000,
        }
    }
}

impl EngineConfig {
    /// Reads configuration from the process environment. Unset variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            config.poll_interval = match raw.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => Duration::from_millis(millis),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: POLL_INTERVAL_ENV,
                        value: raw,
                        reason: "a positive number of milliseconds",
                    });
                }
            };
        }

        if let Some(raw) = lookup(MAX_TICKS_ENV) {
            config.max_ticks = match raw.trim().parse::<u32>() {
                Ok(ticks) if ticks > 0 => ticks,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: MAX_TICKS_ENV,
                        value: raw,
                        reason: "a positive integer",
                    });
                }
            };
        }

        Ok(config)
    }
}
