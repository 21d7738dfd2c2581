//! Configuration module for the dataset controller.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::collections::HashMap;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    pub dataset_api_url: String,
    pub zebedee_url: String,
    pub babbage_url: String,
    /// Sent as a bearer token to upstreams when set
    pub service_auth_token: Option<String>,
    /// Page size for the batched list endpoints
    pub batch_size: usize,
    /// Concurrent page fetches for the batched list endpoints
    pub batch_max_workers: usize,
    pub upstream_timeout: Duration,
    pub healthcheck_interval: Duration,
    pub healthcheck_critical_timeout: Duration,
    pub graceful_shutdown_timeout: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_kv(&env_map(std::env::vars_os()))
    }

    /// Build configuration from a key/value map.
    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| kv.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let bind_addr = parse(kv, "BIND_ADDR", "127.0.0.1:24000")?;

        let log_format = match get("LOG_FORMAT").unwrap_or("text") {
            f if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            f if f.eq_ignore_ascii_case("text") => LogFormat::Text,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                    message: "expected text or json".to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            dataset_api_url: get("DATASET_API_URL")
                .unwrap_or("http://localhost:22000")
                .to_string(),
            zebedee_url: get("ZEBEDEE_URL")
                .unwrap_or("http://localhost:8082")
                .to_string(),
            babbage_url: get("BABBAGE_URL")
                .unwrap_or("http://localhost:8080")
                .to_string(),
            service_auth_token: get("SERVICE_AUTH_TOKEN").map(str::to_string),
            batch_size: positive(kv, "BATCH_SIZE", 100)?,
            batch_max_workers: positive(kv, "BATCH_MAX_WORKERS", 10)?,
            upstream_timeout: Duration::from_millis(positive(kv, "UPSTREAM_TIMEOUT_MS", 10_000)?),
            healthcheck_interval: Duration::from_secs(positive(
                kv,
                "HEALTHCHECK_INTERVAL_SECS",
                30,
            )?),
            healthcheck_critical_timeout: Duration::from_secs(positive(
                kv,
                "HEALTHCHECK_CRITICAL_TIMEOUT_SECS",
                90,
            )?),
            graceful_shutdown_timeout: Duration::from_secs(parse(
                kv,
                "GRACEFUL_SHUTDOWN_TIMEOUT_SECS",
                "5",
            )?),
            log_level: get("LOG_LEVEL").unwrap_or("info").to_string(),
            log_format,
        })
    }
}

/// Collect environment variables, skipping any whose key or value is not valid UTF-8.
fn env_map(vars: impl Iterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn parse<T>(kv: &HashMap<String, String>, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = kv
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(default);

    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        message: e.to_string(),
    })
}

fn positive<T>(kv: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + ToString,
    T::Err: std::fmt::Display,
{
    let value: T = parse(kv, key, &default.to_string())?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
