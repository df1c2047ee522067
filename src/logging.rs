//! Logging setup.
//!
//! Events go to stderr and, when a log file is configured, are appended to
//! that file as well. The subscriber is installed as the default for the
//! calling thread and stays active for as long as the returned [`LogGuard`]
//! lives, so `main` initializes it once and holds the guard until exit.
//!
//! `POSTCRAFT_LOG` takes precedence over the configured level and accepts any
//! `EnvFilter` directive, e.g. `POSTCRAFT_LOG=postcraft=debug,reqwest=info`.
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::{AppError, AppResult};

pub const LOG_ENV_VAR: &str = "POSTCRAFT_LOG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Valid options: text, json", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error, off
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Appended to in addition to stderr; `null` disables the file.
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("postcraft.log"))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            format: LogFormat::default(),
            file: default_log_file(),
        }
    }
}

/// Keeps the subscriber installed; dropping it restores the previous one.
#[must_use = "logging stops when the guard is dropped"]
pub struct LogGuard {
    _default: DefaultGuard,
}

pub fn init(config: &LoggingConfig) -> AppResult<LogGuard> {
    let filter = build_filter(config)?;
    let file = config.file.as_deref().map(open_log_file).transpose()?;
    let base = Registry::default().with(filter);

    let guard = match config.format {
        LogFormat::Text => {
            let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
            let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));
            tracing::subscriber::set_default(base.with(console).with(file_layer))
        }
        LogFormat::Json => {
            let console = fmt::layer().json().with_writer(std::io::stderr);
            let file_layer = file.map(|f| fmt::layer().json().with_writer(Mutex::new(f)));
            tracing::subscriber::set_default(base.with(console).with(file_layer))
        }
    };

    Ok(LogGuard { _default: guard })
}

fn build_filter(config: &LoggingConfig) -> AppResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| AppError::Config(format!("Invalid log level '{}': {}", config.level, e)))
}

fn open_log_file(path: &Path) -> AppResult<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Config(format!("Failed to create log directory {}: {}", parent.display(), e)))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Config(format!("Failed to open log file {}: {}", path.display(), e)))
}
