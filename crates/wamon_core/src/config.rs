//! TOML-based application configuration.
//!
//! # Responsibility
//! - Resolve the database path and logging settings for one process.
//! - Persist the database path chosen by the user.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Environment overrides (`WAMON_DB_PATH`, `WAMON_LOG_LEVEL`) win over
//!   file values.
//!
//! Configuration lives at `~/.wamon/config.toml`.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = ".wamon";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "wamon.db";
const LOG_DIR_NAME: &str = "logs";

pub const ENV_DB_PATH: &str = "WAMON_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "WAMON_LOG_LEVEL";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Serialize(toml::ser::Error),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to serialize config: {err}"),
            Self::Write { path, source } => {
                write!(f, "failed to write config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_level")]
    pub log_level: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_level(),
            log_dir: default_log_dir(),
        }
    }
}

impl AppConfig {
    /// Loads config from `path` and applies environment overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads config from `path` only; a missing file yields defaults.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key| lookup(key).filter(|value: &String| !value.trim().is_empty());
        if let Some(path) = non_blank(ENV_DB_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(level) = non_blank(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// Writes this config to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)
    }
}

/// Returns `~/.wamon`, falling back to `./.wamon` without a home directory.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    app_dir().join(CONFIG_FILE_NAME)
}

fn default_database_path() -> PathBuf {
    app_dir().join(DATABASE_FILE_NAME)
}

fn default_log_dir() -> PathBuf {
    app_dir().join(LOG_DIR_NAME)
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ENV_DB_PATH, ENV_LOG_LEVEL};
    use std::path::PathBuf;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.database_path.ends_with("wamon.db"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = \"/tmp/journal.db\"\n").unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/journal.db"));
        assert_eq!(config.log_dir, AppConfig::default().log_dir);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            database_path: PathBuf::from("/data/wamon.db"),
            log_level: "warn".to_string(),
            log_dir: PathBuf::from("/data/logs"),
        };

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_file(&path).unwrap(), config);
    }

    #[test]
    fn overrides_replace_file_values_but_ignore_blanks() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_DB_PATH => Some("/override/wamon.db".to_string()),
            ENV_LOG_LEVEL => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.database_path, PathBuf::from("/override/wamon.db"));
        assert_eq!(config.log_level, AppConfig::default().log_level);
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = [").unwrap();

        let err = AppConfig::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
