//! services/tracker/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use production_tracker_core::endpoint::{EndpointPolicy, DEFAULT_REQUIRED_PREFIX};
use production_tracker_core::service::{MirrorPolicy, ServiceConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
    pub log_level: Level,
    /// The spreadsheet endpoint shipped with the deployment. A URL saved at
    /// runtime through `PUT /remote` takes precedence.
    pub sheets_api_url: Option<String>,
    pub sheets_url_prefix: String,
    pub remote_timeout: Duration,
    /// `None` disables periodic reconciliation.
    pub sync_interval: Option<Duration>,
    pub await_delete_mirror: bool,
    pub await_write_mirror: bool,
    pub seed_demo_data: bool,
    pub cors_origin: String,
    /// Marks the session cookie `Secure`; enable when served over HTTPS.
    pub secure_cookies: bool,
}

fn var_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and storage ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Remote spreadsheet bridge ---
        let sheets_api_url = std::env::var("SHEETS_API_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let sheets_url_prefix = std::env::var("SHEETS_URL_PREFIX")
            .unwrap_or_else(|_| DEFAULT_REQUIRED_PREFIX.to_string());

        let remote_timeout = Duration::from_secs(var_or("REMOTE_TIMEOUT_SECS", 15u64)?);
        if remote_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "REMOTE_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let sync_interval = match var_or("SYNC_INTERVAL_SECS", 300u64)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        // --- Storage service behaviour ---
        let await_delete_mirror = var_or("AWAIT_DELETE_MIRROR", true)?;
        let await_write_mirror = var_or("AWAIT_WRITE_MIRROR", false)?;
        let seed_demo_data = var_or("SEED_DEMO_DATA", false)?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let secure_cookies = var_or("SECURE_COOKIES", false)?;

        Ok(Self {
            bind_address,
            data_dir,
            log_level,
            sheets_api_url,
            sheets_url_prefix,
            remote_timeout,
            sync_interval,
            await_delete_mirror,
            await_write_mirror,
            seed_demo_data,
            cors_origin,
            secure_cookies,
        })
    }

    /// The storage service settings derived from this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            mirror: MirrorPolicy {
                await_deletes: self.await_delete_mirror,
                await_writes: self.await_write_mirror,
            },
            endpoint: EndpointPolicy::new(self.sheets_url_prefix.clone()),
            configured_remote_url: self.sheets_api_url.clone(),
            seed_demo_data: self.seed_demo_data,
            ..ServiceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_config_carries_mirror_policy() {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            data_dir: PathBuf::from("./data"),
            log_level: Level::INFO,
            sheets_api_url: Some("https://script.google.com/macros/s/x/exec".to_string()),
            sheets_url_prefix: DEFAULT_REQUIRED_PREFIX.to_string(),
            remote_timeout: Duration::from_secs(15),
            sync_interval: None,
            await_delete_mirror: false,
            await_write_mirror: true,
            seed_demo_data: true,
            cors_origin: "http://localhost:3000".to_string(),
            secure_cookies: false,
        };

        let service = config.service_config();
        assert!(!service.mirror.await_deletes);
        assert!(service.mirror.await_writes);
        assert!(service.seed_demo_data);
        assert_eq!(service.configured_remote_url, config.sheets_api_url);
    }
}
