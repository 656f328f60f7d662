use std::str::FromStr;
use std::time::Duration;

use crate::auth::tokens::TokenConfig;
use crate::limiter::RateLimitConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Reported by the health check (default: `development`).
    pub environment: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Connection pool size (default: `25`).
    pub db_max_connections: u32,
    pub rate_limit: RateLimitConfig,
    pub tokens: TokenConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `4000`                  |
    /// | `ENVIRONMENT`                | `development`           |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `DB_MAX_CONNECTIONS`         | `25`                    |
    /// | `LIMITER_ENABLED`            | `true`                  |
    /// | `LIMITER_RPS`                | `2.0`                   |
    /// | `LIMITER_BURST`              | `4`                     |
    /// | `LIMITER_IDLE_SECS`          | `180`                   |
    /// | `LIMITER_SWEEP_SECS`         | `60`                    |
    /// | `TRUST_PROXY_HEADERS`        | `false`                 |
    /// | `AUTH_TOKEN_TTL_HOURS`       | `24`                    |
    /// | `ACTIVATION_TOKEN_TTL_HOURS` | `72`                    |
    ///
    /// Panics on unparsable values; misconfiguration should stop startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit = RateLimitConfig {
            enabled: env_or("LIMITER_ENABLED", true),
            rps: env_or("LIMITER_RPS", 2.0),
            burst: env_or("LIMITER_BURST", 4),
            idle_timeout: Duration::from_secs(env_or("LIMITER_IDLE_SECS", 180)),
            sweep_interval: Duration::from_secs(env_or("LIMITER_SWEEP_SECS", 60)),
            trust_proxy_headers: env_or("TRUST_PROXY_HEADERS", false),
        };

        let tokens = TokenConfig {
            authentication_ttl: chrono::Duration::hours(env_or("AUTH_TOKEN_TTL_HOURS", 24)),
            activation_ttl: chrono::Duration::hours(env_or("ACTIVATION_TOKEN_TTL_HOURS", 72)),
        };

        Self {
            host,
            port: env_or("PORT", 4000),
            environment,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 25),
            rate_limit,
            tokens,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid value ({raw:?}): {e}")),
        Err(_) => default,
    }
}
