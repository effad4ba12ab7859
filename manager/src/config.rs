//! Environment configuration
//!
//! All knobs come from `KOUKKU_*` environment variables with defaults that
//! match the deployment layout (sidecars mount their sockets under
//! `/var/run/koukku-hooks`). Parsing is split into pure helpers so tests
//! never mutate process environment.

use crate::error::{ManagerError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default socket directory mounted into the manager's container
pub const DEFAULT_SOCKET_DIR: &str = "/var/run/koukku-hooks";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log collectors
    Json,
    /// Human-readable output, the default
    Pretty,
}

/// Runtime configuration for the discovery engine
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for sidecar sockets (`KOUKKU_SOCKET_DIR`)
    pub socket_dir: PathBuf,
    /// Readiness target for `collect` (`KOUKKU_EXPECTED_SIDECARS`)
    pub expected_sidecars: usize,
    /// Overall discovery deadline (`KOUKKU_COLLECT_TIMEOUT_SECS`)
    pub collect_timeout: Duration,
    /// Per-call probe bound, connect and Info each (`KOUKKU_PROBE_TIMEOUT_MS`)
    pub probe_timeout: Duration,
    /// Pause between directory scans (`KOUKKU_POLL_INTERVAL_MS`)
    pub poll_interval: Duration,
    /// Log filter directive (`KOUKKU_LOG_LEVEL`)
    pub log_level: String,
    /// Log output format (`KOUKKU_LOG_FORMAT`: `json` or `pretty`)
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
            expected_sidecars: 0,
            collect_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(1000),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from `KOUKKU_*` environment variables, falling
    /// back to defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            socket_dir: std::env::var("KOUKKU_SOCKET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.socket_dir),
            expected_sidecars: parse_count(
                "KOUKKU_EXPECTED_SIDECARS",
                std::env::var("KOUKKU_EXPECTED_SIDECARS").ok().as_deref(),
            )?
            .unwrap_or(defaults.expected_sidecars),
            collect_timeout: parse_duration_secs(
                "KOUKKU_COLLECT_TIMEOUT_SECS",
                std::env::var("KOUKKU_COLLECT_TIMEOUT_SECS").ok().as_deref(),
            )?
            .unwrap_or(defaults.collect_timeout),
            probe_timeout: parse_duration_millis(
                "KOUKKU_PROBE_TIMEOUT_MS",
                std::env::var("KOUKKU_PROBE_TIMEOUT_MS").ok().as_deref(),
            )?
            .unwrap_or(defaults.probe_timeout),
            poll_interval: parse_duration_millis(
                "KOUKKU_POLL_INTERVAL_MS",
                std::env::var("KOUKKU_POLL_INTERVAL_MS").ok().as_deref(),
            )?
            .unwrap_or(defaults.poll_interval),
            log_level: std::env::var("KOUKKU_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_log_format(std::env::var("KOUKKU_LOG_FORMAT").ok().as_deref())?,
        })
    }
}

fn parse_count(var: &str, value: Option<&str>) -> Result<Option<usize>> {
    value
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| ManagerError::Config(format!("{var}: invalid count '{raw}'")))
        })
        .transpose()
}

fn parse_duration_secs(var: &str, value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ManagerError::Config(format!("{var}: invalid seconds '{raw}'")))
        })
        .transpose()
}

fn parse_duration_millis(var: &str, value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ManagerError::Config(format!("{var}: invalid milliseconds '{raw}'")))
        })
        .transpose()
}

fn parse_log_format(value: Option<&str>) -> Result<LogFormat> {
    match value {
        None | Some("pretty") => Ok(LogFormat::Pretty),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(ManagerError::Config(format!(
            "KOUKKU_LOG_FORMAT: expected 'json' or 'pretty', got '{other}'"
        ))),
    }
}
