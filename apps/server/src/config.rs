use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use vnscreen_core::cache::DEFAULT_CACHE_TTL;
use vnscreen_core::refresh::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MARKET_TZ};

/// Upper bound for `VNS_CACHE_TTL_SECS` (one week).
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// Operator key for `/api/admin`. Admin routes reject every call when unset.
    pub admin_key: Option<String>,
    pub provider_base_url: String,
    pub provider_api_key: Option<String>,
    pub provider_timeout: Duration,
    pub market_tz: Tz,
    pub strict_credentials: bool,
    pub cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
    pub scheduler_enabled: bool,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("VNS_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid VNS_LISTEN_ADDR")?;
        let db_path = env_or("VNS_DB_PATH", "./db/screener.db");
        let admin_key = env_opt("VNS_ADMIN_KEY");
        let provider_base_url = env_or("VNS_PROVIDER_BASE_URL", "http://127.0.0.1:8001");
        let provider_api_key = env_opt("VNS_PROVIDER_API_KEY");
        let provider_timeout = Duration::from_secs(env_u64(
            "VNS_PROVIDER_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT.as_secs(),
        )?);
        let market_tz = match env_opt("VNS_MARKET_TZ") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Invalid VNS_MARKET_TZ '{}': {}", name, e))?,
            None => DEFAULT_MARKET_TZ,
        };
        let strict_credentials = env_flag("VNS_STRICT_CREDENTIALS", false);
        let cache_ttl = cache_ttl_from(env_u64(
            "VNS_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL.as_secs(),
        )?)?;
        let cache_sweep_interval = Duration::from_secs(env_u64("VNS_CACHE_SWEEP_SECS", 60)?.max(1));
        let scheduler_enabled = env_flag("VNS_SCHEDULER_ENABLED", true);
        let cors_allow = env_or("VNS_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms = env_u64("VNS_REQUEST_TIMEOUT_MS", 30_000)?;

        Ok(Self {
            listen_addr,
            db_path,
            admin_key,
            provider_base_url,
            provider_api_key,
            provider_timeout,
            market_tz,
            strict_credentials,
            cache_ttl,
            cache_sweep_interval,
            scheduler_enabled,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> anyhow::Result<u64> {
    match env_opt(name) {
        Some(v) => v.parse().with_context(|| format!("Invalid {}: '{}'", name, v)),
        None => Ok(default),
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env_opt(name) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

fn cache_ttl_from(secs: u64) -> anyhow::Result<Duration> {
    if secs > MAX_CACHE_TTL_SECS {
        anyhow::bail!(
            "Invalid VNS_CACHE_TTL_SECS: {} exceeds the maximum of {}",
            secs,
            MAX_CACHE_TTL_SECS
        );
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_ttl_is_bounded() {
        assert_eq!(cache_ttl_from(300).unwrap(), Duration::from_secs(300));
        assert_eq!(
            cache_ttl_from(MAX_CACHE_TTL_SECS).unwrap(),
            Duration::from_secs(MAX_CACHE_TTL_SECS)
        );
        assert!(cache_ttl_from(MAX_CACHE_TTL_SECS + 1).is_err());
        assert!(cache_ttl_from(u64::MAX).is_err());
    }
}
