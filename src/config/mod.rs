//! Configuration module for Manu Filter.
//!
//! Settings are loaded from an optional file (TOML, JSON or YAML) and then
//! overridden by environment variables such as `MANU__FILTER__BUCKET_COUNT`.
//! All values are validated before use.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError as ExternalConfigError, Environment, File, FileFormat};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::config::ConfigError;

pub mod filter;
pub mod persistence;

pub use filter::FilterSettings;
pub use persistence::PersistenceSettings;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MANU";

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration for Manu Filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ManuConfig {
    /// Filter geometry and hashing
    pub filter: FilterSettings,

    /// Snapshot location for the command-line tool
    pub persistence: PersistenceSettings,

    /// Log configuration
    pub log: LogConfig,
}

impl Validate for ManuConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.filter.validate()?;
        self.persistence.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,

    /// Whether to include source code locations in logs
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            source_location: false,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.level
            ))),
        }
    }
}

/// Configuration loader for Manu Filter.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to the configuration file
    /// * `env_prefix` - Prefix for environment variables that override configuration values
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Loads the configuration from a file and environment variables.
    ///
    /// # Errors
    ///
    /// `FileNotFound` if a path was given and does not exist, `ParseError`
    /// if a source cannot be read or deserialized, and any validation error.
    pub fn load(&self) -> ConfigResult<ManuConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&ManuConfig::default())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        );

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }

            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("json") => FileFormat::Json,
                Some("yaml" | "yml") => FileFormat::Yaml,
                _ => {
                    return Err(ConfigError::ParseError(format!(
                        "Unsupported file extension for: {path:?}"
                    )))
                }
            };
            builder = builder.add_source(File::from(path.as_path()).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| match e {
            ExternalConfigError::NotFound(path) => ConfigError::FileNotFound(PathBuf::from(path)),
            other => ConfigError::ParseError(other.to_string()),
        })?;

        let manu_config: ManuConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        manu_config.validate()?;

        Ok(manu_config)
    }
}

/// Serialize `config` as TOML at `path`, creating parent directories.
pub fn write_config(config: &ManuConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    }
    let toml = toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    std::fs::write(path, toml).map_err(|e| ConfigError::WriteError(e.to_string()))
}

static GLOBAL_CONFIG: OnceCell<ManuConfig> = OnceCell::new();

/// Initialize the global configuration.
///
/// # Errors
///
/// `AlreadyInitialized` on a second call; the first configuration stays.
pub fn init_global_config(config: ManuConfig) -> ConfigResult<()> {
    GLOBAL_CONFIG.set(config).map_err(|_| {
        tracing::warn!("Global configuration was already initialized, ignoring new configuration");
        ConfigError::AlreadyInitialized
    })
}

/// The global configuration, if initialized.
pub fn global_config() -> Option<&'static ManuConfig> {
    GLOBAL_CONFIG.get()
}
