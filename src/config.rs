// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The JWT signing key is shared with the authentication provider that
//! issues session tokens; everything else has a sensible default.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for the rest-timer polling interval.
pub const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Directory backing the on-device progress store
    pub local_store_dir: PathBuf,
    /// Rest-timer polling interval (never above one second)
    pub rest_poll_interval: Duration,
    /// Capacity of the foreground → background notifier channel
    pub notifier_queue_capacity: usize,
    /// Keep background notifications visible until dismissed
    pub notification_require_interaction: bool,
    /// Workouts per month shown as the dashboard goal
    pub monthly_goal: u32,
    /// How long shutdown waits for pending background notifications
    pub shutdown_grace: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            local_store_dir: env::temp_dir().join("workout-tracker-test"),
            rest_poll_interval: Duration::from_millis(250),
            notifier_queue_capacity: 64,
            notification_require_interaction: true,
            monthly_goal: 20,
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Configuration used by tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let poll_ms: u64 = parse_or("REST_POLL_INTERVAL_MS", 500)?;
        if poll_ms == 0 || poll_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(
                "REST_POLL_INTERVAL_MS",
                format!("must be between 1 and {}", MAX_POLL_INTERVAL_MS),
            ));
        }

        let queue_capacity: usize = parse_or("NOTIFIER_QUEUE_CAPACITY", 256)?;
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "NOTIFIER_QUEUE_CAPACITY",
                "must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            local_store_dir: env::var("LOCAL_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/local")),
            rest_poll_interval: Duration::from_millis(poll_ms),
            notifier_queue_capacity: queue_capacity,
            notification_require_interaction: parse_or("NOTIFICATION_REQUIRE_INTERACTION", true)?,
            monthly_goal: parse_or("MONTHLY_GOAL", 20)?,
            shutdown_grace: Duration::from_secs(parse_or("SHUTDOWN_GRACE_SECS", 5)?),
        })
    }
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse '{}'", raw))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
