use crate::core::config::data::{path_display, AssistantsFile, ValidationsFile};
use crate::core::config::defaults::{
    ASSISTANTS_FILE_NAME, DEFAULT_ASSISTANTS, DEFAULT_VALIDATIONS, VALIDATIONS_FILE_NAME,
};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Errors that can occur when locating, seeding, or loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No per-user directory could be resolved for this platform.
    NoHomeDirectory,

    /// Failed to write a default file into the config directory.
    Seed {
        /// Path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoHomeDirectory => {
                write!(f, "Cannot determine the user's home directory")
            }
            ConfigError::Seed { path, source } => {
                write!(
                    f,
                    "Failed to create default config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path_display(path),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::NoHomeDirectory => None,
            ConfigError::Seed { source, .. } => Some(source),
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Resolved locations of the per-user configuration files.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
}

impl ConfigPaths {
    /// Platform config directory for gail (e.g. `~/.config/gail` on Linux).
    pub fn resolve() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "gail").ok_or(ConfigError::NoHomeDirectory)?;
        Ok(Self::at(dirs.config_dir()))
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn assistants(&self) -> PathBuf {
        self.config_dir.join(ASSISTANTS_FILE_NAME)
    }

    pub fn validations(&self) -> PathBuf {
        self.config_dir.join(VALIDATIONS_FILE_NAME)
    }

    /// Create the config directory and write any missing default files.
    pub fn ensure_seeded(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Seed {
            path: self.config_dir.clone(),
            source,
        })?;
        seed_file(&self.assistants(), DEFAULT_ASSISTANTS)?;
        seed_file(&self.validations(), DEFAULT_VALIDATIONS)?;
        Ok(())
    }

    pub fn load_assistants(&self) -> Result<AssistantsFile, ConfigError> {
        load_toml(&self.assistants())
    }

    pub fn load_validations(&self) -> Result<ValidationsFile, ConfigError> {
        load_toml(&self.validations())
    }
}

fn seed_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if path.exists() {
        debug!(path = %path.display(), "config file present, not seeding");
        return Ok(());
    }

    let to_seed_error = |source: std::io::Error| ConfigError::Seed {
        path: path.to_path_buf(),
        source,
    };
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent).map_err(to_seed_error)?;
    temp_file
        .write_all(contents.as_bytes())
        .map_err(to_seed_error)?;
    temp_file
        .persist(path)
        .map_err(|err| to_seed_error(err.error))?;

    info!(path = %path.display(), "seeded default config file");
    Ok(())
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
