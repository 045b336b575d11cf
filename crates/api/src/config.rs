use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use docport_core::backoff::Backoff;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// Everything except `DATABASE_URL` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub database_url: String,
    /// Initial wait between maintenance-lock attempts (default: `5`).
    pub maintenance_retry_secs: u64,
    /// Ceiling for the maintenance wait (default: same as the initial wait).
    pub maintenance_retry_max_secs: u64,
    /// Maintenance lock TTL; `0` means the lock never expires (default: `600`).
    pub maintenance_lock_ttl_secs: u64,
    /// Per-host import lock TTL; `0` means the lock never expires (default: `300`).
    pub import_lock_ttl_secs: u64,
    /// How often expired locks are purged (default: `60`).
    pub lock_reaper_interval_secs: u64,
    /// Export schema version sent to sources (default: `1`).
    pub exports_schema_version: u32,
    /// Timeout for export endpoint calls (default: `30`).
    pub exports_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `DATABASE_URL`               | required                |
    /// | `MAINTENANCE_RETRY_SECS`     | `5`                     |
    /// | `MAINTENANCE_RETRY_MAX_SECS` | `MAINTENANCE_RETRY_SECS`|
    /// | `MAINTENANCE_LOCK_TTL_SECS`  | `600`                   |
    /// | `IMPORT_LOCK_TTL_SECS`       | `300`                   |
    /// | `LOCK_REAPER_INTERVAL_SECS`  | `60`                    |
    /// | `EXPORTS_SCHEMA_VERSION`     | `1`                     |
    /// | `EXPORTS_TIMEOUT_SECS`       | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let maintenance_retry_secs = parse_var(&lookup, "MAINTENANCE_RETRY_SECS", 5u64)?;
        let maintenance_retry_max_secs =
            parse_var(&lookup, "MAINTENANCE_RETRY_MAX_SECS", maintenance_retry_secs)?;
        let maintenance_lock_ttl_secs = parse_var(&lookup, "MAINTENANCE_LOCK_TTL_SECS", 600u64)?;
        let import_lock_ttl_secs = parse_var(&lookup, "IMPORT_LOCK_TTL_SECS", 300u64)?;
        let lock_reaper_interval_secs = parse_var(&lookup, "LOCK_REAPER_INTERVAL_SECS", 60u64)?;
        let exports_schema_version = parse_var(&lookup, "EXPORTS_SCHEMA_VERSION", 1u32)?;
        let exports_timeout_secs = parse_var(&lookup, "EXPORTS_TIMEOUT_SECS", 30u64)?;

        require_positive("MAINTENANCE_RETRY_SECS", maintenance_retry_secs)?;
        require_positive("LOCK_REAPER_INTERVAL_SECS", lock_reaper_interval_secs)?;
        require_positive("EXPORTS_TIMEOUT_SECS", exports_timeout_secs)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            maintenance_retry_secs,
            maintenance_retry_max_secs,
            maintenance_lock_ttl_secs,
            import_lock_ttl_secs,
            lock_reaper_interval_secs,
            exports_schema_version,
            exports_timeout_secs,
        })
    }

    pub fn maintenance_backoff(&self) -> Backoff {
        Backoff {
            initial: Duration::from_secs(self.maintenance_retry_secs),
            max: Duration::from_secs(self.maintenance_retry_max_secs),
        }
    }

    pub fn maintenance_lock_ttl(&self) -> Option<Duration> {
        ttl(self.maintenance_lock_ttl_secs)
    }

    pub fn import_lock_ttl(&self) -> Option<Duration> {
        ttl(self.import_lock_ttl_secs)
    }

    pub fn lock_reaper_interval(&self) -> Duration {
        Duration::from_secs(self.lock_reaper_interval_secs)
    }

    pub fn exports_timeout(&self) -> Duration {
        Duration::from_secs(self.exports_timeout_secs)
    }
}

fn ttl(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_var<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

fn require_positive(var: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}
