//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable the check-in script reads to decide whether to
/// run its fare checker.
pub const FARE_CHECK_ENV_VAR: &str = "AUTO_SOUTHWEST_CHECK_IN_CHECK_FARES";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub action: ActionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Delay policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between accepting a check-in and launching it.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Offset reported to callers as `scheduledFor`. Informational only.
    #[serde(default = "default_advertised_offset_hours")]
    pub advertised_offset_hours: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            advertised_offset_hours: default_advertised_offset_hours(),
        }
    }
}

fn default_delay_secs() -> u64 {
    5
}

fn default_advertised_offset_hours() -> u64 {
    24
}

/// External check-in action configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Executable to launch.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the confirmation number and passenger name.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Working directory for the process (inherits ours when unset).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Environment overrides applied on top of the inherited environment.
    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
            env: default_env(),
        }
    }
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["southwest.py".to_string()]
}

fn default_env() -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert(FARE_CHECK_ENV_VAR.to_string(), "false".to_string());
    env
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily-rotated log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
