//! Environment-driven configuration.
//!
//! Values come from the process environment (after `.env` is loaded by the
//! binary); CLI flags override them.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::estimation::{FALLBACK_RATES, RateTable};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Authoritative service settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON rate table served as authoritative. Built-in rates when unset.
    pub rates_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Load the table this server treats as authoritative.
    pub fn load_rate_table(&self) -> Result<RateTable, ConfigError> {
        match &self.rates_file {
            Some(path) => RateTable::from_json_file(path),
            None => Ok(FALLBACK_RATES),
        }
    }
}

/// Settings for talking to the authoritative service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `http://127.0.0.1:8080`. Endpoints live under `/api`.
    pub base_url: String,
    /// Per-request timeout. Hitting it triggers the local fallback.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "invalid log format '{}', expected 'pretty' or 'json'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub log_format: LogFormat,
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("BUILDQUOTE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get("BUILDQUOTE_PORT"), "BUILDQUOTE_PORT", DEFAULT_PORT)?;
        let rates_file = get("BUILDQUOTE_RATES_FILE").map(PathBuf::from);

        let base_url = get("BUILDQUOTE_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT));
        let timeout_secs = parse_or(
            get("BUILDQUOTE_TIMEOUT_SECS"),
            "BUILDQUOTE_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BUILDQUOTE_TIMEOUT_SECS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let log_format = parse_or(
            get("BUILDQUOTE_LOG_FORMAT"),
            "BUILDQUOTE_LOG_FORMAT",
            LogFormat::default(),
        )?;

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                rates_file,
            },
            client: ClientConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            log_format,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}': {}", value, e),
        }),
        None => Ok(default),
    }
}
