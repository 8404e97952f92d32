//! Configuration for the shell interpreter and logging defaults.

use std::fs;
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::de::Error as TomlDeError;
use toml::ser::Error as TomlSerError;
use toml::{from_str, to_string_pretty};
use tracing::debug;

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("Config file I/O failed for {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: IoError,
    },

    /// The config file is not valid TOML for this schema.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// TOML deserialization failure.
        source: TomlDeError,
    },

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] TomlSerError),

    /// The home directory holding the default config file is unknown.
    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

/// Complete toolbelt configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbeltConfig {
    /// Command interpreter used by the `bash` tool
    pub shell: ShellConfig,
    /// Logging defaults for front ends
    pub logging: LoggingConfig,
}

/// Command interpreter invocation.
///
/// The command line is passed as the argument following `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter program, looked up on `PATH` when not absolute
    pub program: String,
    /// Arguments placed before the command line
    pub args: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "bash".to_owned(),
            args: vec!["-c".to_owned()],
        }
    }
}

/// Logging defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "toolbelt_tools=info,toolbelt=info".to_owned(),
        }
    }
}

impl ToolbeltConfig {
    /// Get the default config directory path (`~/.toolbelt`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".toolbelt"))
    }

    /// Get the default config file path (`~/.toolbelt/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, falling back to defaults when
    /// no file exists there.
    ///
    /// # Errors
    /// Returns an error if an existing config file cannot be read or parsed
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let Ok(config_path) = Self::config_path() else {
            debug!("No home directory, using default configuration");
            return Ok(Self::default());
        };

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            "Loaded config from {}: shell={} {:?}",
            path.display(),
            config.shell.program,
            config.shell.args
        );

        Ok(config)
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let contents = to_string_pretty(self)?;
        let header = "# Toolbelt Configuration File\n\
                      # Edit this file to customize the shell and logging defaults\n\n";

        fs::write(path, format!("{header}{contents}")).map_err(io_error)
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ToolbeltConfig::default();
        assert_eq!(config.shell.program, "bash");
        assert_eq!(config.shell.args, vec!["-c".to_owned()]);
        assert!(config.logging.filter.contains("toolbelt_tools=info"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[shell]\nprogram = \"sh\"\n").unwrap();

        let config = ToolbeltConfig::load_from_file(&path).unwrap();
        assert_eq!(config.shell.program, "sh");
        assert_eq!(config.shell.args, vec!["-c".to_owned()]);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let mut config = ToolbeltConfig::default();
        config.logging.filter = "debug".to_owned();

        config.save_to_file(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Toolbelt Configuration File"));

        let loaded = ToolbeltConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[shell\nprogram = ").unwrap();

        let err = ToolbeltConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = ToolbeltConfig::load_from_file(&temp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
