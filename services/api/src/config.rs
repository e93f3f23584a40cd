//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use legal_welfare_core::DEFAULT_CAPACITY;

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
    /// Base URL of the legal-welfare backend (login and chat history).
    pub backend_url: String,
    pub log_level: Level,
    /// Where the key-value cache is persisted. `None` keeps it in memory.
    pub cache_path: Option<PathBuf>,
    pub cache_max_items: usize,
    pub chat_history_timeout: Duration,
    pub cors_origin: String,
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
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let backend_url = lookup("BACKEND_URL")
            .or_else(|| lookup("NEXT_PUBLIC_BACKEND_URL"))
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Cache Settings ---
        let cache_path = lookup("CACHE_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let cache_max_items = match lookup("CACHE_MAX_ITEMS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "CACHE_MAX_ITEMS".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ))
                }
            },
            None => DEFAULT_CAPACITY,
        };

        // --- Chat History Client ---
        let timeout_secs = match lookup("CHAT_HISTORY_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("CHAT_HISTORY_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => 10,
        };

        Ok(Self {
            bind_address,
            backend_url,
            log_level,
            cache_path,
            cache_max_items,
            chat_history_timeout: Duration::from_secs(timeout_secs),
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.cache_path, None);
        assert_eq!(config.cache_max_items, 100);
        assert_eq!(config.chat_history_timeout, Duration::from_secs(10));
    }

    #[test]
    fn public_backend_url_is_a_fallback() {
        let config = load(&[("NEXT_PUBLIC_BACKEND_URL", "https://api.example.org/")]).unwrap();
        assert_eq!(config.backend_url, "https://api.example.org");

        let config = load(&[
            ("BACKEND_URL", "http://backend:8000"),
            ("NEXT_PUBLIC_BACKEND_URL", "https://api.example.org"),
        ])
        .unwrap();
        assert_eq!(config.backend_url, "http://backend:8000");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "BIND_ADDRESS"
        ));
        assert!(matches!(
            load(&[("CACHE_MAX_ITEMS", "0")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "CACHE_MAX_ITEMS"
        ));
        assert!(load(&[("RUST_LOG", "chatty")]).is_err());
    }
}
