//! Console configuration.
//!
//! Loaded once at startup and passed to every component that needs it.
//! Sources, highest priority first: `DOORMAN_*` environment variables, the
//! optional `config.toml` in the console home directory, built-in defaults.
//!
//! Environment variables:
//! - `DOORMAN_URL` — management API origin (default: `http://localhost:3002`)
//! - `DOORMAN_HOME` — console home directory (default: `~/.doorman`)
//! - `DOORMAN_PAGE_SIZE` — page size for list views (default: `10`)
//! - `DOORMAN_REFRESH_SECS` — credential refresh interval (default: `900`)
//! - `DOORMAN_TIMEOUT_SECS` — request timeout, `0` disables it (default: disabled)
//! - `DOORMAN_LOG_LEVEL` — log filter (default: `warn`)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};

/// Default management API origin.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3002";
/// Default list page size, matching the backend's own default.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Default credential refresh interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Name of the optional config file inside the console home.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Console UI theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme (default).
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ConsoleError::Validation(format!(
                "unknown theme '{other}' (expected 'light' or 'dark')"
            ))),
        }
    }
}

/// Process-wide console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Management API origin, without a trailing slash.
    pub base_url: String,
    /// Directory holding the config file and the client-side stores.
    pub home_dir: PathBuf,
    /// Page size used by list views.
    pub page_size: u32,
    /// How long a credential is used before it is refreshed.
    pub refresh_interval: Duration,
    /// Optional per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Log filter for `tracing-subscriber`.
    pub log_level: String,
    /// UI theme, filled in from the stored preference at startup.
    pub theme: Theme,
}

/// Shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub refresh_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub theme: Option<Theme>,
}

impl FileConfig {
    /// Parse a `config.toml` document.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Config`] if the document is not valid TOML or
    /// contains unknown keys.
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ConsoleError::Config(format!("invalid config.toml: {e}")))
    }

    /// Read `config.toml` from `dir`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Config`] if the file exists but cannot be read
    /// or parsed.
    pub fn read_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ConsoleError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::parse(&raw).map(Some)
    }
}

impl ConsoleConfig {
    /// Load configuration from the process environment and the optional
    /// config file in the console home.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Config`] if no home directory can be resolved,
    /// a numeric variable does not parse, or the config file is invalid.
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let home_dir = resolve_home(&lookup)?;
        let file = FileConfig::read_from(&home_dir)?.unwrap_or_default();
        Self::from_sources(&lookup, home_dir, file)
    }

    /// Build a configuration from an explicit variable lookup and file
    /// contents. `load` is a thin wrapper around this.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Config`] if a numeric variable does not parse.
    pub fn from_sources(
        lookup: &dyn Fn(&str) -> Option<String>,
        home_dir: PathBuf,
        file: FileConfig,
    ) -> Result<Self> {
        let base_url = first_non_empty(&[
            lookup("DOORMAN_URL").as_deref(),
            file.base_url.as_deref(),
            Some(DEFAULT_BASE_URL),
        ])
        .trim_end_matches('/')
        .to_owned();

        let page_size = match lookup("DOORMAN_PAGE_SIZE") {
            Some(raw) => parse_number::<u32>("DOORMAN_PAGE_SIZE", &raw)?,
            None => file.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        };
        if page_size == 0 {
            return Err(ConsoleError::Config("page size must be at least 1".to_owned()));
        }

        let refresh_interval = match lookup("DOORMAN_REFRESH_SECS") {
            Some(raw) => Duration::from_secs(parse_number("DOORMAN_REFRESH_SECS", &raw)?),
            None => file
                .refresh_secs
                .map_or(DEFAULT_REFRESH_INTERVAL, Duration::from_secs),
        };

        let timeout_secs = match lookup("DOORMAN_TIMEOUT_SECS") {
            Some(raw) => Some(parse_number::<u64>("DOORMAN_TIMEOUT_SECS", &raw)?),
            None => file.timeout_secs,
        };
        let request_timeout = timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let log_level = first_non_empty(&[
            lookup("DOORMAN_LOG_LEVEL").as_deref(),
            file.log_level.as_deref(),
            Some("warn"),
        ]);

        Ok(Self {
            base_url,
            home_dir,
            page_size,
            refresh_interval,
            request_timeout,
            log_level,
            theme: file.theme.unwrap_or_default(),
        })
    }

    /// Path of the persistent local store (credential, preferences).
    #[must_use]
    pub fn local_store_path(&self) -> PathBuf {
        self.home_dir.join("local.json")
    }

    /// Path of the session store (selection slots).
    #[must_use]
    pub fn session_store_path(&self) -> PathBuf {
        self.home_dir.join("session.json")
    }
}

/// Resolve the console home: `DOORMAN_HOME` > `$HOME/.doorman`.
fn resolve_home(lookup: &dyn Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = lookup("DOORMAN_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    #[cfg(windows)]
    let home = lookup("USERPROFILE");
    #[cfg(not(windows))]
    let home = lookup("HOME");
    home.filter(|v| !v.is_empty())
        .map(|h| PathBuf::from(h).join(".doorman"))
        .ok_or_else(|| ConsoleError::Config("cannot resolve home directory — set DOORMAN_HOME".to_owned()))
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConsoleError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

fn first_non_empty(vals: &[Option<&str>]) -> String {
    vals.iter()
        .flatten()
        .find(|v| !v.is_empty())
        .map(|v| (*v).to_owned())
        .unwrap_or_default()
}
