use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use folio_core::config::{ServiceConfig, DEFAULT_MAX_UPLOAD_BYTES, PDF_MIME_TYPE};
use folio_core::retry::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// How long to wait for a pooled connection.
    pub db_acquire_timeout: Duration,
    /// Secret for session tokens and signed blob URLs.
    pub jwt_secret: String,
    /// Root directory of the filesystem blob store.
    pub storage_dir: PathBuf,
    /// Externally reachable origin, used to build blob URLs.
    pub public_base_url: String,
    pub max_upload_bytes: u64,
    pub allowed_mime_type: String,
    pub signed_url_ttl: Duration,
    pub session_ttl: Duration,
    pub session_verify_attempts: u32,
    pub session_verify_delay: Duration,
    /// Bound on each store call made by a service.
    pub store_timeout: Duration,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        Ok(Self {
            host: vars.string("HOST", "0.0.0.0"),
            port: vars.parse("PORT", 3030)?,
            database_url: (vars.0)("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: vars.parse("DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: vars.parse("DB_MIN_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(vars.parse("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            jwt_secret: vars.string("JWT_SECRET", "dev-secret-change-me-in-production"),
            storage_dir: PathBuf::from(vars.string("STORAGE_DIR", "./data/blobs")),
            public_base_url: vars.string("PUBLIC_BASE_URL", "http://localhost:3030"),
            max_upload_bytes: vars.parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            allowed_mime_type: vars.string("ALLOWED_MIME_TYPE", PDF_MIME_TYPE),
            signed_url_ttl: Duration::from_secs(vars.parse("SIGNED_URL_TTL_SECS", 3600)?),
            session_ttl: Duration::from_secs(vars.parse("SESSION_TTL_SECS", 7 * 24 * 3600)?),
            session_verify_attempts: vars.parse("SESSION_VERIFY_ATTEMPTS", 5)?,
            session_verify_delay: Duration::from_millis(vars.parse("SESSION_VERIFY_DELAY_MS", 1000)?),
            store_timeout: Duration::from_millis(vars.parse("STORE_TIMEOUT_MS", 10_000)?),
            event_bus_capacity: vars.parse("EVENT_BUS_CAPACITY", 1024)?,
            log_level: vars.string("LOG_LEVEL", "info"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_upload_bytes: self.max_upload_bytes,
            allowed_mime_type: self.allowed_mime_type.clone(),
            signed_url_ttl: self.signed_url_ttl,
            store_timeout: self.store_timeout,
            session_ttl: self.session_ttl,
            session_verify: RetryPolicy::new(self.session_verify_attempts, self.session_verify_delay),
        }
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, var: &str, default: &str) -> String {
        (self.0)(var).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.0)(var) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        }
    }
}
