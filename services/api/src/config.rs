//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use alumni_connect_core::{ReapplicationPolicy, DEFAULT_MAX_MENTEES};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

const DEFAULT_USERINFO_URL: &str = "https://api.linkedin.com/v2/userinfo";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `IdentityStore` implementation backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub log_level: Level,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub reapplication_policy: ReapplicationPolicy,
    pub default_max_mentees: u32,
    pub identity_userinfo_url: String,
    pub upstream_timeout: Duration,
    pub cors_origin: String,
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
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
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Storage Settings ---
        let bind_address = parse_var(
            "BIND_ADDRESS",
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;

        let store_backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Session Token Settings ---
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        let token_ttl_hours = parse_var("TOKEN_TTL_HOURS", 24 * 30)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Load Workflow Settings ---
        let reapplication_policy = parse_var("REAPPLICATION_POLICY", ReapplicationPolicy::Never)?;
        let default_max_mentees = parse_var("DEFAULT_MAX_MENTEES", DEFAULT_MAX_MENTEES)?;
        if default_max_mentees == 0 {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_MAX_MENTEES".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Load Upstream Identity Settings ---
        let identity_userinfo_url = std::env::var("IDENTITY_USERINFO_URL")
            .unwrap_or_else(|_| DEFAULT_USERINFO_URL.to_string());
        let upstream_timeout = Duration::from_millis(parse_var("UPSTREAM_TIMEOUT_MS", 5_000u64)?);

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            store_backend,
            database_url,
            log_level,
            jwt_secret,
            token_ttl_hours,
            reapplication_policy,
            default_max_mentees,
            identity_userinfo_url,
            upstream_timeout,
            cors_origin,
        })
    }
}
