//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which provider backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// In-process table owned by a `MemoryCacheProvider`
    Memory,
    /// Remote Redis store behind a `RemoteCacheProvider`
    Redis,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Backend::Memory),
            "redis" => Ok(Backend::Redis),
            other => Err(format!("unknown cache backend: {other}")),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend used by the binary
    pub backend: Backend,
    /// Default TTL in milliseconds applied when a write asks for the provider default
    pub default_ttl_ms: u64,
    /// Interval in milliseconds between background sweeps of the memory table
    pub sweep_interval_ms: u64,
    /// Connection URL for the Redis backend
    pub redis_url: String,
    /// Namespace prepended to every key built by the binary
    pub namespace: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 60000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000, minimum: 1)
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `CACHE_NAMESPACE` - Key namespace (default: key_cache)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.backend),
            default_ttl_ms: parse_var("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            sweep_interval_ms: parse_var("CACHE_SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.sweep_interval_ms),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            namespace: env::var("CACHE_NAMESPACE").unwrap_or(defaults.namespace),
        }
    }

    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Sweep interval as a `Duration`, never shorter than one millisecond.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            default_ttl_ms: 60_000,
            sweep_interval_ms: 1_000,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            namespace: "key_cache".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.default_ttl_ms, 60_000);
        assert_eq!(config.sweep_interval_ms, 1_000);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.namespace, "key_cache");
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("CACHE_BACKEND");
        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("CACHE_SWEEP_INTERVAL_MS");
        env::remove_var("REDIS_URL");
        env::remove_var("CACHE_NAMESPACE");

        let config = Config::from_env();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.default_ttl(), Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_sweep_interval_is_raised() {
        let config = Config {
            sweep_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("redis".parse::<Backend>(), Ok(Backend::Redis));
        assert_eq!(" Memory ".parse::<Backend>(), Ok(Backend::Memory));
        assert!("sentinel".parse::<Backend>().is_err());
    }
}
