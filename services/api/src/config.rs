//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use topic_core::FlowSettings;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub cors_origin: String,
    pub free_search_limit: u32,
    pub trend_window: usize,
    pub trend_top_k: usize,
    pub store_timeout: Duration,
    /// Idle time after which a session is forgotten.
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let flow = FlowSettings::default();
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            cors_origin: "http://localhost:3000".to_string(),
            free_search_limit: flow.free_search_limit,
            trend_window: flow.trend_window,
            trend_top_k: flow.trend_top_k,
            store_timeout: flow.store_timeout,
            session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = parse_or(&lookup, "BIND_ADDRESS", defaults.bind_address)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Search Flow Settings ---
        let free_search_limit = parse_or(&lookup, "FREE_SEARCH_LIMIT", defaults.free_search_limit)?;
        let trend_window = parse_or(&lookup, "TREND_WINDOW", defaults.trend_window)?;
        let trend_top_k = parse_or(&lookup, "TREND_TOP_K", defaults.trend_top_k)?;
        let store_timeout_ms = parse_or(
            &lookup,
            "STORE_TIMEOUT_MS",
            defaults.store_timeout.as_millis() as u64,
        )?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "STORE_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // --- Session Settings ---
        let session_ttl_secs =
            parse_or(&lookup, "SESSION_TTL_SECS", defaults.session_ttl.as_secs())?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            free_search_limit,
            trend_window,
            trend_top_k,
            store_timeout: Duration::from_millis(store_timeout_ms),
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            free_search_limit: self.free_search_limit,
            trend_window: self.trend_window,
            trend_top_k: self.trend_top_k,
            store_timeout: self.store_timeout,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
