use std::time::Duration;

use anyhow::{Context, Result};

/// Client configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Gradpilot backend, e.g. `http://localhost:8000`.
    pub api_base_url: String,
    /// Quiet period for the job-description sync debounce.
    pub sync_debounce: Duration,
    /// Per-request timeout for all backend calls.
    pub request_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let debounce_ms = std::env::var("SYNC_DEBOUNCE_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<u64>()
            .context("SYNC_DEBOUNCE_MS must be a whole number of milliseconds")?;

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            api_base_url: require_env("GRADPILOT_API_URL")?,
            sync_debounce: Duration::from_millis(debounce_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
