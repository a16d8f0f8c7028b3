//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use purchase::PurchaseConfig;

const DEFAULT_CACHE_OP_TIMEOUT_MS: u64 = 2000;

/// Relational store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_conn_lifetime: Duration,
}

/// Reservation cache connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl RedisConfig {
    /// Returns the `redis://` connection URL.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}:{}/0", password, self.host, self.port),
            None => format!("redis://{}:{}/0", self.host, self.port),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `json` for JSON lines, anything else for text
/// - `DB_URL`, `DB_MAX_CONNECTIONS` (10), `DB_MIN_CONNECTIONS` (2),
///   `DB_MAX_CONN_LIFETIME_SECS` (3600)
/// - `REDIS_HOST`, `REDIS_PORT` (6379), `REDIS_PASSWORD`
/// - `CART_TTL_SECS` (3600), `REQUEST_TIMEOUT_SECS` (50), `CACHE_OP_TIMEOUT_MS` (2000)
///
/// Without `DB_URL` and `REDIS_HOST` the server runs on in-memory stores.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub cart_ttl: Duration,
    pub request_timeout: Duration,
    pub cache_op_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let database = non_empty("DB_URL").map(|url| DatabaseConfig {
            url,
            max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), 10),
            min_connections: parse_or(lookup("DB_MIN_CONNECTIONS"), 2),
            max_conn_lifetime: Duration::from_secs(parse_or(
                lookup("DB_MAX_CONN_LIFETIME_SECS"),
                3600,
            )),
        });

        let redis = non_empty("REDIS_HOST").map(|host| RedisConfig {
            host,
            port: parse_or(lookup("REDIS_PORT"), 6379),
            password: non_empty("REDIS_PASSWORD"),
        });

        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(lookup("PORT"), defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database,
            redis,
            cart_ttl: Duration::from_secs(parse_or(
                lookup("CART_TTL_SECS"),
                defaults.cart_ttl.as_secs(),
            )),
            request_timeout: Duration::from_secs(parse_or(
                lookup("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )),
            cache_op_timeout: Duration::from_millis(parse_or(
                lookup("CACHE_OP_TIMEOUT_MS"),
                DEFAULT_CACHE_OP_TIMEOUT_MS,
            )),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Purchase tunables derived from this configuration.
    pub fn purchase_config(&self) -> PurchaseConfig {
        PurchaseConfig {
            cart_ttl: self.cart_ttl,
            deadline: self.request_timeout,
        }
    }
}

/// Parses `value` as `T`, falling back to `default` when absent or out of range.
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        let purchase = PurchaseConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_json: false,
            database: None,
            redis: None,
            cart_ttl: purchase.cart_ttl,
            request_timeout: purchase.deadline,
            cache_op_timeout: Duration::from_millis(DEFAULT_CACHE_OP_TIMEOUT_MS),
        }
    }
}
