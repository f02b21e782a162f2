//! Diagnostic log file setup.
//!
//! The terminal belongs to the TUI, so tracing output goes to a dated file
//! under the per-user data directory instead.

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Full `EnvFilter` directive that overrides `--log-level` when set.
pub const LOG_ENV: &str = "GAIL_LOG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    NoDataDirectory,
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    Install(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::NoDataDirectory => {
                write!(f, "Cannot determine a data directory for log files")
            }
            LoggingError::CreateDir { path, source } => {
                write!(f, "Failed to create log directory {}: {source}", path.display())
            }
            LoggingError::OpenFile { path, source } => {
                write!(f, "Failed to open log file {}: {source}", path.display())
            }
            LoggingError::Filter { directive, source } => {
                write!(f, "Invalid log filter '{directive}': {source}")
            }
            LoggingError::Install(message) => write!(f, "Failed to install logger: {message}"),
        }
    }
}

impl StdError for LoggingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LoggingError::CreateDir { source, .. } | LoggingError::OpenFile { source, .. } => {
                Some(source)
            }
            LoggingError::Filter { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn default_log_dir() -> Result<PathBuf, LoggingError> {
    ProjectDirs::from("", "", "gail")
        .map(|dirs| dirs.data_dir().join("logs"))
        .ok_or(LoggingError::NoDataDirectory)
}

/// `gail_YYYY-MM-DD.log`
pub fn log_file_name(date: NaiveDate) -> String {
    format!("gail_{}.log", date.format("%Y-%m-%d"))
}

/// `GAIL_LOG` when present and non-empty, otherwise the CLI level.
pub fn build_filter(level: LogLevel, env_override: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directive = env_override
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(level.directive());
    EnvFilter::try_new(directive).map_err(|source| LoggingError::Filter {
        directive: directive.to_string(),
        source,
    })
}

/// Install the global subscriber writing to today's file in `dir`.
/// Returns the log file path.
pub fn init_logging(level: LogLevel, dir: &Path) -> Result<PathBuf, LoggingError> {
    let env_override = std::env::var(LOG_ENV).ok();
    let filter = build_filter(level, env_override.as_deref())?;

    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(log_file_name(Local::now().date_naive()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::OpenFile {
            path: path.clone(),
            source,
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))?;

    Ok(path)
}
