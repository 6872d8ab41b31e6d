//! Configuration management for the booking client.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The binary calls `dotenvy::dotenv()` first, so a `.env` file works too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The backend URL is not an http(s) URL
    #[error("BOOKING_API_URL must start with http:// or https://, got {0:?}")]
    InvalidApiUrl(String),

    /// The user id is empty
    #[error("BOOKING_USER_ID must not be empty")]
    EmptyUserId,
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL (`BOOKING_API_URL`)
    pub api_url: String,
    /// User id sent with bookings (`BOOKING_USER_ID`)
    pub user_id: String,
    /// Success message lifetime (`BOOKING_MESSAGE_TTL_SECS`)
    pub message_ttl: Duration,
    /// Notification lifetime (`BOOKING_NOTIFICATION_TTL_SECS`)
    pub notification_ttl: Duration,
    /// Ticket cache stale time (`BOOKING_TICKETS_STALE_SECS`)
    pub tickets_stale_time: Duration,
    /// Graceful shutdown timeout (`BOOKING_SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `BOOKING_API_URL` is not an http(s) URL or
    /// `BOOKING_USER_ID` is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), Utc::now())
    }

    /// Load configuration through `lookup`, generating the default user id from `now`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F, now: DateTime<Utc>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seconds = |name: &str, default: u64| {
            let secs = lookup(name)
                .and_then(|value| {
                    value.trim().parse().ok().or_else(|| {
                        tracing::warn!(variable = name, value = %value, default, "Ignoring invalid duration");
                        None
                    })
                })
                .unwrap_or(default);
            Duration::from_secs(secs)
        };

        let api_url = lookup("BOOKING_API_URL").unwrap_or_else(|| "http://localhost:4000".to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let user_id = lookup("BOOKING_USER_ID").unwrap_or_else(|| format!("user-{}", now.timestamp_millis()));
        if user_id.trim().is_empty() {
            return Err(ConfigError::EmptyUserId);
        }

        Ok(Self {
            api_url,
            user_id,
            message_ttl: seconds("BOOKING_MESSAGE_TTL_SECS", 7),
            notification_ttl: seconds("BOOKING_NOTIFICATION_TTL_SECS", 3),
            tickets_stale_time: seconds("BOOKING_TICKETS_STALE_SECS", 0),
            shutdown_timeout: seconds("BOOKING_SHUTDOWN_TIMEOUT_SECS", 5),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;
    use ticket_booking_core::Clock;
    use ticket_booking_testing::test_clock;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned(), test_clock().now())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.api_url, "http://localhost:4000");
        assert_eq!(config.user_id, "user-1735689600000");
        assert_eq!(config.message_ttl, Duration::from_secs(7));
        assert_eq!(config.notification_ttl, Duration::from_secs(3));
        assert_eq!(config.tickets_stale_time, Duration::ZERO);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BOOKING_API_URL", "https://tickets.example.com"),
            ("BOOKING_USER_ID", "user-42"),
            ("BOOKING_MESSAGE_TTL_SECS", "10"),
            ("BOOKING_TICKETS_STALE_SECS", "30"),
        ])
        .unwrap();

        assert_eq!(config.api_url, "https://tickets.example.com");
        assert_eq!(config.user_id, "user-42");
        assert_eq!(config.message_ttl, Duration::from_secs(10));
        assert_eq!(config.tickets_stale_time, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let config = load(&[("BOOKING_NOTIFICATION_TTL_SECS", "soon")]).unwrap();
        assert_eq!(config.notification_ttl, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let error = load(&[("BOOKING_API_URL", "localhost:4000")]).unwrap_err();
        assert_eq!(error, ConfigError::InvalidApiUrl("localhost:4000".to_string()));
    }

    #[test]
    fn test_empty_user_id_is_rejected() {
        assert_eq!(load(&[("BOOKING_USER_ID", " ")]).unwrap_err(), ConfigError::EmptyUserId);
    }
}
