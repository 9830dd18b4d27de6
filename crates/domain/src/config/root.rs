use serde::{Deserialize, Serialize};

use super::context::{ContextConfig, MAX_REQUEST_TIMEOUT};
use super::errors::ConfigError;
use super::logging::LoggingConfig;

const LOCAL_CONFIG_PATH: &str = "ferrous-rdns.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-rdns/config.toml";

/// Main configuration structure for the reverse-lookup broker
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BrokerConfig {
    /// Settings for contexts created from this configuration
    #[serde(default)]
    pub context: ContextConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BrokerConfig {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-rdns.toml in current directory
    /// 3. /etc/ferrous-rdns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = Self::get_config_path() {
            Self::from_file(&found)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(timeout) = overrides.request_timeout_secs {
            self.context.request_timeout_secs = timeout;
        }
        if let Some(path) = overrides.engine_config_path {
            self.context.use_system_resolver = false;
            self.context.engine_config_path = Some(path);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.request_timeout().is_zero() {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.context.request_timeout_secs > MAX_REQUEST_TIMEOUT.as_secs() {
            return Err(ConfigError::Validation(format!(
                "request_timeout_secs must not exceed {}",
                MAX_REQUEST_TIMEOUT.as_secs()
            )));
        }

        if let Some(path) = &self.context.engine_config_path {
            if path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "engine_config_path cannot be empty".to_string(),
                ));
            }
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "Unknown log format '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Some(LOCAL_CONFIG_PATH.to_string())
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Some(SYSTEM_CONFIG_PATH.to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub request_timeout_secs: Option<u64>,
    pub engine_config_path: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}
