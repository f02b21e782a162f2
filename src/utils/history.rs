//! Plain-text conversation history under `~/gail_history`.

use crate::core::config::data::path_display;
use crate::utils::ansi::strip_ansi_codes;
use chrono::{DateTime, Local};
use directories::BaseDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub const HISTORY_DIR_NAME: &str = "gail_history";
const SLUG_MAX_LEN: usize = 40;
const SLUG_FALLBACK: &str = "conversation";

#[derive(Debug)]
pub enum PersistError {
    NoHomeDirectory,
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::NoHomeDirectory => {
                write!(f, "Cannot determine the home directory for conversation history")
            }
            PersistError::CreateDir { path, source } => write!(
                f,
                "Failed to create history directory {}: {}",
                path_display(path),
                source
            ),
            PersistError::Write { path, source } => write!(
                f,
                "Failed to save conversation to {}: {}",
                path_display(path),
                source
            ),
        }
    }
}

impl StdError for PersistError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PersistError::NoHomeDirectory => None,
            PersistError::CreateDir { source, .. } | PersistError::Write { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Writes the session transcript to one file, chosen on the first save.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// `~/gail_history`.
    pub fn default_dir() -> Result<PathBuf, PersistError> {
        let dirs = BaseDirs::new().ok_or(PersistError::NoHomeDirectory)?;
        Ok(dirs.home_dir().join(HISTORY_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Replace the session file with `transcript`, stripped of escape codes.
    pub fn save(&mut self, transcript: &str, now: DateTime<Local>) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = match &self.current {
            Some(path) => path.clone(),
            None => {
                let first_line = transcript.lines().next().unwrap_or_default();
                self.dir.join(history_file_name(first_line, now))
            }
        };

        write_atomically(&path, &strip_ansi_codes(transcript))?;
        info!(path = %path.display(), "saved conversation");
        self.current = Some(path.clone());
        Ok(path)
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), PersistError> {
    let to_write_error = |source: std::io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent).map_err(to_write_error)?;
    temp_file
        .write_all(contents.as_bytes())
        .map_err(to_write_error)?;
    temp_file
        .persist(path)
        .map_err(|err| to_write_error(err.error))?;
    Ok(())
}

/// `YYYY-MM-DD-HH-MM-SS_<slug>.txt`
pub fn history_file_name(first_line: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.txt", now.format("%Y-%m-%d-%H-%M-%S"), slug(first_line))
}

fn slug(first_line: &str) -> String {
    let line = strip_ansi_codes(first_line);
    let line = line.trim();
    let line = line.strip_prefix("You:").unwrap_or(line);

    let mut slug = String::new();
    for word in line
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        let extra = if slug.is_empty() { word.len() } else { word.len() + 1 };
        if slug.len() + extra > SLUG_MAX_LEN {
            if slug.is_empty() {
                slug.push_str(&word[..SLUG_MAX_LEN].to_ascii_lowercase());
            }
            break;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word.to_ascii_lowercase());
    }

    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug
    }
}
