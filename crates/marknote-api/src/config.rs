//! Server configuration loaded from the environment.
//!
//! Environment variables:
//!   DATABASE_URL           - PostgreSQL connection string
//!   HOST / PORT            - bind address (default 0.0.0.0:8080)
//!   DB_MAX_CONNECTIONS     - pool size (default 10)
//!   TOKEN_TTL_HOURS        - session lifetime (default 24)
//!   COOKIE_SECURE          - set `Secure` on the session cookie (default true)
//!   ALLOWED_ORIGINS        - comma-separated CORS allow-list
//!   RATE_LIMIT_ENABLED     - global rate limiting (default true)
//!   RATE_LIMIT_REQUESTS    - requests per period (default 100)
//!   RATE_LIMIT_PERIOD_SECS - period length (default 60)

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use axum::http::HeaderValue;
use marknote_core::{defaults, Error, HashParams, Result};

/// Global request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests: NonZeroU32,
    pub period: StdDuration,
}

impl RateLimitConfig {
    /// Time for one request slot to refill.
    pub fn replenish_interval(&self) -> StdDuration {
        self.period / self.requests.get()
    }
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub token_ttl: chrono::Duration,
    pub cookie_secure: bool,
    pub allowed_origins: Vec<HeaderValue>,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimitConfig>,
    /// Argon2 cost for new password hashes. Not read from the environment.
    pub hash_params: HashParams,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
            token_ttl: chrono::Duration::hours(defaults::TOKEN_TTL_HOURS),
            cookie_secure: defaults::COOKIE_SECURE,
            allowed_origins: parse_allowed_origins(defaults::ALLOWED_ORIGINS),
            rate_limit: Some(RateLimitConfig {
                requests: NonZeroU32::new(defaults::RATE_LIMIT_REQUESTS).unwrap_or(NonZeroU32::MIN),
                period: StdDuration::from_secs(defaults::RATE_LIMIT_PERIOD_SECS),
            }),
            hash_params: HashParams::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    ///
    /// Unset variables fall back to defaults; set but unparsable ones are
    /// `Error::Config`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token_ttl_hours: i64 =
            parse_var(&lookup, "TOKEN_TTL_HOURS", defaults::TOKEN_TTL_HOURS)?;
        let token_ttl = Some(token_ttl_hours)
            .filter(|h| (1..=defaults::MAX_TOKEN_TTL_HOURS).contains(h))
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| {
                Error::Config(format!(
                    "TOKEN_TTL_HOURS must be between 1 and {}",
                    defaults::MAX_TOKEN_TTL_HOURS
                ))
            })?;

        let db_max_connections: u32 =
            parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults::DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(Error::Config("DB_MAX_CONNECTIONS must be positive".to_string()));
        }

        let rate_limit = if parse_bool(&lookup, "RATE_LIMIT_ENABLED", true)? {
            let requests: u32 =
                parse_var(&lookup, "RATE_LIMIT_REQUESTS", defaults::RATE_LIMIT_REQUESTS)?;
            let period_secs: u64 =
                parse_var(&lookup, "RATE_LIMIT_PERIOD_SECS", defaults::RATE_LIMIT_PERIOD_SECS)?;
            let requests = NonZeroU32::new(requests)
                .ok_or_else(|| Error::Config("RATE_LIMIT_REQUESTS must be positive".to_string()))?;
            if period_secs == 0 {
                return Err(Error::Config("RATE_LIMIT_PERIOD_SECS must be positive".to_string()));
            }
            let limit = RateLimitConfig {
                requests,
                period: StdDuration::from_secs(period_secs),
            };
            if limit.replenish_interval().is_zero() {
                return Err(Error::Config(format!(
                    "RATE_LIMIT_REQUESTS {} is too many for a {period_secs}s period",
                    requests.get()
                )));
            }
            Some(limit)
        } else {
            None
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port: parse_var(&lookup, "PORT", defaults::PORT)?,
            db_max_connections,
            token_ttl,
            cookie_secure: parse_bool(&lookup, "COOKIE_SECURE", defaults::COOKIE_SECURE)?,
            allowed_origins: parse_allowed_origins(
                &lookup("ALLOWED_ORIGINS").unwrap_or_else(|| defaults::ALLOWED_ORIGINS.to_string()),
            ),
            rate_limit,
            hash_params: HashParams::default(),
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| Error::Config(format!("invalid bind address {addr}: {e}")))
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid {key} {raw:?}: {e}"))),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(Error::Config(format!("invalid {key} {other:?}: expected true or false"))),
    }
}

/// Parse a comma-separated origin list, skipping entries that are not valid
/// header values. An empty list falls back to the default origin.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(
                        subsystem = "api",
                        component = "config",
                        "Invalid CORS origin '{}': {}",
                        trimmed,
                        e
                    );
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        return vec![HeaderValue::from_static(defaults::ALLOWED_ORIGINS)];
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.token_ttl, chrono::Duration::hours(24));
        assert!(config.cookie_secure);
        assert_eq!(config.allowed_origins.len(), 1);
        let rate = config.rate_limit.unwrap();
        assert_eq!(rate.requests.get(), 100);
        assert_eq!(rate.period, StdDuration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("TOKEN_TTL_HOURS", "2"),
            ("COOKIE_SECURE", "false"),
            ("RATE_LIMIT_ENABLED", "0"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.token_ttl, chrono::Duration::hours(2));
        assert!(!config.cookie_secure);
        assert!(config.rate_limit.is_none());
        assert_eq!(config.allowed_origins.len(), 2);
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("TOKEN_TTL_HOURS", "0"),
            ("COOKIE_SECURE", "maybe"),
            ("RATE_LIMIT_REQUESTS", "0"),
            ("DB_MAX_CONNECTIONS", "-1"),
            ("TOKEN_TTL_HOURS", "-5"),
        ] {
            let result = ServerConfig::from_lookup(lookup_from(&[(key, value)]));
            assert!(matches!(result, Err(Error::Config(_))), "{key}={value}");
        }
    }

    #[test]
    fn test_token_ttl_upper_bound() {
        let max = defaults::MAX_TOKEN_TTL_HOURS.to_string();
        let config = ServerConfig::from_lookup(lookup_from(&[("TOKEN_TTL_HOURS", max.as_str())])).unwrap();
        assert_eq!(config.token_ttl, chrono::Duration::hours(defaults::MAX_TOKEN_TTL_HOURS));

        for value in ["8761", "10000000000", "9223372036854775807"] {
            let result = ServerConfig::from_lookup(lookup_from(&[("TOKEN_TTL_HOURS", value)]));
            assert!(matches!(result, Err(Error::Config(_))), "TOKEN_TTL_HOURS={value}");
        }
    }

    #[test]
    fn test_rate_limit_too_fine_for_period() {
        let result = ServerConfig::from_lookup(lookup_from(&[
            ("RATE_LIMIT_PERIOD_SECS", "1"),
            ("RATE_LIMIT_REQUESTS", "2000000000"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));

        let config = ServerConfig::from_lookup(lookup_from(&[
            ("RATE_LIMIT_PERIOD_SECS", "1"),
            ("RATE_LIMIT_REQUESTS", "1000"),
        ]))
        .unwrap();
        let limit = config.rate_limit.unwrap();
        assert_eq!(limit.replenish_interval(), StdDuration::from_millis(1));
    }

    #[test]
    fn test_allowed_origins_parsing() {
        let origins = parse_allowed_origins("https://a.example,,  http://localhost:3000 ");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1].to_str().unwrap(), "http://localhost:3000");

        let origins = parse_allowed_origins("");
        assert_eq!(origins, vec![HeaderValue::from_static(defaults::ALLOWED_ORIGINS)]);
    }
}
