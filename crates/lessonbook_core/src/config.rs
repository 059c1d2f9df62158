//! Layered application configuration.
//!
//! # Responsibility
//! - Merge built-in defaults, an optional TOML file and `LESSONBOOK_*`
//!   environment variables (`__` separates nested keys) into [`AppConfig`].
//! - Validate values that later layers rely on.
//!
//! # Invariants
//! - Configuration is an explicit value handed to constructors; nothing in
//!   this crate reads it from process-wide state.
//! - `Debug` output never contains the model API key.

use crate::intent::keyword::Roster;
use crate::model::lesson::DEFAULT_ROOM;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `LESSONBOOK_MODEL__API_KEY`.
pub const ENV_PREFIX: &str = "LESSONBOOK_";
/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "lessonbook.toml";

const DEFAULT_DB_PATH: &str = "lessonbook.db";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_MODEL_NAME: &str = "gemini-exp-1206";
const DEFAULT_MODEL_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Room used when a lesson does not name one.
    pub default_room: String,
    pub log: LogConfig,
    pub model: ModelConfig,
    pub roster: Roster,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            default_room: DEFAULT_ROOM.to_string(),
            log: LogConfig::default(),
            model: ModelConfig::default(),
            roster: Roster::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `None` picks the build-mode default.
    pub level: Option<String>,
    /// Relative paths are resolved against the working directory.
    pub dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: None,
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

/// External language model used as the intent fallback.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fallback is disabled when absent.
    pub api_key: Option<String>,
    pub name: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl ModelConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            name: DEFAULT_MODEL_NAME.to_string(),
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
        }
    }
}

impl Debug for ModelConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Requests with a larger body are rejected before parsing.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_SERVER_ADDR.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Merge or extraction failed.
    Figment(Box<figment::Error>),
    /// An explicitly requested config file does not exist.
    MissingFile(PathBuf),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "configuration error: {err}"),
            Self::MissingFile(path) => {
                write!(f, "configuration file `{}` does not exist", path.display())
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid configuration value for `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err.as_ref()),
            Self::MissingFile(_) | Self::InvalidValue { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

impl AppConfig {
    /// Provider chain: defaults, then `file` (or `lessonbook.toml` when
    /// present), then environment variables.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates configuration.
    ///
    /// # Errors
    /// - `MissingFile` when `file` is given but absent.
    /// - `Figment` when a source cannot be parsed into [`AppConfig`].
    /// - `InvalidValue` when a loaded value is unusable.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }

        let config: Self = Self::figment(file).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_room.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_room",
                reason: "must not be blank".to_string(),
            });
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "db_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_body_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "model.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ModelConfig};

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.default_room, "Cab 1");
        assert_eq!(config.server.addr, "127.0.0.1:8000");
        assert!(!config.model.is_configured());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let model = ModelConfig {
            api_key: Some("secret-key".to_string()),
            ..ModelConfig::default()
        };
        let rendered = format!("{model:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let model = ModelConfig {
            api_key: Some("  ".to_string()),
            ..ModelConfig::default()
        };
        assert!(!model.is_configured());
    }
}
