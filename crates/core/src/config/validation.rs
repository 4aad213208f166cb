//! Range checks applied to a loaded `AppConfig`.

use crate::config::AppConfig;
use thiserror::Error;

/// Reasons a configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

const MAX_BODY_LIMIT: usize = 50 * 1024 * 1024;
const TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=300_000;
const MAX_REDIRECT_LIMIT: usize = 20;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Reject values the transport cannot work with.
    ///
    /// Body limit must be 1 byte to 50MB, timeout 100ms to 5 minutes,
    /// at most 20 redirects, and the User-Agent must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 || self.max_bytes > MAX_BODY_LIMIT {
            return Err(invalid("max_bytes", "must be between 1 byte and 50MB"));
        }

        if !TIMEOUT_RANGE_MS.contains(&self.timeout_ms) {
            return Err(invalid("timeout_ms", "must be between 100ms and 300000ms"));
        }

        if self.max_redirects > MAX_REDIRECT_LIMIT {
            return Err(invalid("max_redirects", "must not exceed 20"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
            tracing::warn!(
                user_agent = %self.user_agent,
                "User-Agent set in both user_agent and headers; the headers entry is sent"
            );
        }

        Ok(())
    }
}
