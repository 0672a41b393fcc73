//! Console configuration: JSON file under the XDG config dir, every field
//! defaulted, with a few environment overrides applied on top.
//! Stored at $XDG_CONFIG_HOME/sysdeck/config.json (fallback ~/.config/sysdeck/config.json)

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ops::LogQuery;
use crate::types::{PackageManager, Severity};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_ms: u64,
    pub fetch_timeout_ms: u64,
    pub command_timeout_ms: u64,
    /// Keep sampling dashboard domains while another view is active.
    pub background_sampling: bool,
    pub log_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_severity: Option<Severity>,
    pub log_max_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<PackageManager>,
    pub connections_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            fetch_timeout_ms: 5000,
            command_timeout_ms: 30_000,
            background_sampling: false,
            log_file: PathBuf::from("/var/log/syslog"),
            log_pattern: None,
            log_since: None,
            log_until: None,
            log_severity: None,
            log_max_entries: 1000,
            package_manager: None,
            connections_limit: 256,
        }
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("sysdeck")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sysdeck")
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

impl Config {
    /// A missing file is not an error; a malformed one is.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match explicit {
            Some(p) => Self::load_from(p)?,
            None => Self::load_from(&config_path())?,
        };
        cfg.apply_env(|k| env::var(k).ok())?;
        Ok(cfg)
    }

    /// Applies `SYSDECK_*` overrides through `lookup` so tests can feed a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| ConfigError::Env { key, value: v }),
            }
        };
        if let Some(v) = parse("SYSDECK_TICK_MS")? {
            self.tick_ms = v;
        }
        if let Some(v) = parse("SYSDECK_FETCH_TIMEOUT_MS")? {
            self.fetch_timeout_ms = v;
        }
        if let Some(v) = parse("SYSDECK_COMMAND_TIMEOUT_MS")? {
            self.command_timeout_ms = v;
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        // 100ms floor keeps a zero from spinning the loop
        Duration::from_millis(self.tick_ms.max(100))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms.max(1))
    }

    pub fn log_query(&self) -> LogQuery {
        LogQuery {
            path: self.log_file.clone(),
            pattern: self.log_pattern.clone().filter(|p| !p.is_empty()),
            since: self.log_since.clone().filter(|s| !s.is_empty()),
            until: self.log_until.clone().filter(|s| !s.is_empty()),
            severity: self.log_severity,
            max_entries: self.log_max_entries,
        }
    }
}
