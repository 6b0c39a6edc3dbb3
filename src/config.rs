//! Configuration Module
//!
//! `CacheConfig` carries everything the engine needs at construction.
//! `ServerConfig` is only used by the server binary and is loaded from
//! environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// == Cache Config ==
/// Construction parameters for a [`Cache`](crate::cache::Cache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,
    /// Time-to-live for new entries, None = entries never expire
    pub ttl: Option<Duration>,
    /// File used by snapshot writes and loads; never read implicitly
    pub snapshot_path: PathBuf,
    /// Interval between expiry sweeps
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a config with no TTL and the default sweep interval.
    pub fn new(capacity: usize, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            capacity,
            ttl: None,
            snapshot_path: snapshot_path.into(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    // == Validate ==
    /// Rejects parameters the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 1 {
            return Err(CacheError::Config(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::Config(
                "sweep interval must be positive".to_string(),
            ));
        }
        if let Some(ttl) = self.ttl {
            if ttl.is_zero() {
                return Err(CacheError::Config("ttl must be positive".to_string()));
            }
            entry_ttl(ttl)?;
        }
        Ok(())
    }
}

/// Converts a TTL into the form stored on entries.
///
/// Rejects lifetimes whose expiry timestamp, measured from now, cannot be
/// represented.
pub(crate) fn entry_ttl(ttl: Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(ttl)
        .ok()
        .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| CacheError::Config(format!("ttl of {:?} is out of range", ttl)))
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// TTL in seconds, None = no expiry
    pub ttl_secs: Option<u64>,
    /// Snapshot file location
    pub snapshot_path: PathBuf,
    /// Expiry sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Restore the snapshot file before serving
    pub load_snapshot_on_start: bool,
    /// Write a snapshot during graceful shutdown
    pub snapshot_on_shutdown: bool,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL_SECS` - TTL in seconds (default: unset, no expiry)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: cache.json)
    /// - `SWEEP_INTERVAL_MS` - Expiry sweep interval (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LOAD_SNAPSHOT_ON_START` - Restore snapshot on boot (default: false)
    /// - `SNAPSHOT_ON_SHUTDOWN` - Write snapshot on shutdown (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            ttl_secs: parse_var("CACHE_TTL_SECS").or(defaults.ttl_secs),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            sweep_interval_ms: parse_var("SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.sweep_interval_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            load_snapshot_on_start: parse_var("LOAD_SNAPSHOT_ON_START")
                .unwrap_or(defaults.load_snapshot_on_start),
            snapshot_on_shutdown: parse_var("SNAPSHOT_ON_SHUTDOWN")
                .unwrap_or(defaults.snapshot_on_shutdown),
        }
    }

    /// Builds the engine configuration.
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::new(self.capacity, self.snapshot_path.clone())
            .with_sweep_interval(Duration::from_millis(self.sweep_interval_ms));
        match self.ttl_secs {
            Some(secs) => config.with_ttl(Duration::from_secs(secs)),
            None => config,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_secs: None,
            snapshot_path: PathBuf::from("cache.json"),
            sweep_interval_ms: 1000,
            server_port: 3000,
            load_snapshot_on_start: false,
            snapshot_on_shutdown: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::new(10, "snap.json");
        assert_eq!(config.capacity, 10);
        assert!(config.ttl.is_none());
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig::new(0, "snap.json");
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = CacheConfig::new(1, "snap.json").with_ttl(Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let config = CacheConfig::new(1, "snap.json").with_sweep_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_huge_ttl_rejected() {
        let config = CacheConfig::new(1, "snap.json").with_ttl(Duration::MAX);
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_ttl_past_representable_time_rejected() {
        // Converts to a chrono duration but overflows once added to now
        let ttl = Duration::from_secs(1_000_000_000_000_000);
        assert!(chrono::Duration::from_std(ttl).is_ok());

        let config = CacheConfig::new(4, "snap.json").with_ttl(ttl);
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_long_ttl_accepted() {
        let ten_years = Duration::from_secs(10 * 365 * 24 * 3600);
        let config = CacheConfig::new(4, "snap.json").with_ttl(ten_years);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.capacity, 1000);
        assert!(config.ttl_secs.is_none());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval_ms, 1000);
        assert!(!config.load_snapshot_on_start);
    }

    #[test]
    fn test_server_config_to_cache_config() {
        let server = ServerConfig {
            ttl_secs: Some(4),
            sweep_interval_ms: 250,
            ..ServerConfig::default()
        };
        let config = server.cache_config();
        assert_eq!(config.ttl, Some(Duration::from_secs(4)));
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
        assert_eq!(config.snapshot_path, PathBuf::from("cache.json"));
    }
}
