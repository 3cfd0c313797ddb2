use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const HISTORY_PATH_VAR: &str = "CHATGPT_HISTORY_PATH";
pub const MAX_TURNS_VAR: &str = "CHATGPT_MAX_TURNS";
pub const SYSTEM_PROMPT_VAR: &str = "CHATGPT_SYSTEM_PROMPT";
pub const TIMEOUT_SECS_VAR: &str = "CHATGPT_TIMEOUT_SECS";
pub const CONFIG_PATH_VAR: &str = "CHATGPT_CONFIG";

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// 60 messages is roughly 30 user/assistant exchanges.
pub const DEFAULT_MAX_TURNS: usize = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const HISTORY_FILE_NAME: &str = ".chatgpt_history.json";
const CONFIG_DIR_NAME: &str = ".chatgpt";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Cannot find home directory")]
    NoHomeDir,

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    /// Extra line printed under the error to tell the user how to fix it.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingApiKey => Some("Set it with: export OPENAI_API_KEY='sk-...'"),
            Self::NoHomeDir => Some("Set CHATGPT_HISTORY_PATH to choose where history is stored."),
            _ => None,
        }
    }
}

/// Optional on-disk settings. Every field may be omitted.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delays_secs: Option<Vec<u64>>,
}

impl ConfigFile {
    /// Read the file at `path`; a missing file yields all defaults.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
    }

    fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

/// Settings resolved once at startup and handed to the client and controller.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub history_path: PathBuf,
    pub max_turns: usize,
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
    pub retry_delays_secs: Vec<u64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("history_path", &self.history_path)
            .field("max_turns", &self.max_turns)
            .field("system_prompt", &self.system_prompt)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_delays_secs", &self.retry_delays_secs)
            .finish()
    }
}

impl Config {
    /// Resolve from the process environment and the optional config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve using `env` as the variable lookup.
    ///
    /// Precedence: environment, then config file, then built-in defaults.
    pub fn resolve(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let file = match env(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .or_else(ConfigFile::default_path)
        {
            Some(path) => ConfigFile::read(&path)?,
            None => ConfigFile::default(),
        };

        let history_path = history_path(env(HISTORY_PATH_VAR), file.history_path)?;

        let max_turns = match env(MAX_TURNS_VAR) {
            Some(raw) => parse_number(MAX_TURNS_VAR, &raw)?,
            None => file.max_turns.unwrap_or(DEFAULT_MAX_TURNS),
        };

        let timeout_secs = match env(TIMEOUT_SECS_VAR) {
            Some(raw) => parse_number(TIMEOUT_SECS_VAR, &raw)?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let config = Self {
            api_key: env(API_KEY_VAR).map(|key| key.trim().to_string()),
            model: env(MODEL_VAR)
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env(BASE_URL_VAR)
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            history_path,
            max_turns,
            system_prompt: env(SYSTEM_PROMPT_VAR)
                .or(file.system_prompt)
                .filter(|prompt| !prompt.trim().is_empty()),
            timeout_secs,
            retry_delays_secs: file.retry_delays_secs.unwrap_or_else(|| vec![2]),
        };

        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but tolerates invalid settings that clearing
    /// history does not depend on.
    pub fn load_for_reset() -> Result<Self, ConfigError> {
        Self::resolve_for_reset(|key| std::env::var(key).ok())
    }

    /// Resolve normally; on failure keep only the history location and the
    /// system prompt, with defaults for everything else.
    pub fn resolve_for_reset(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let err = match Self::resolve(&env) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };
        warn!("{err}; resetting with default settings");

        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        let file = env(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .or_else(ConfigFile::default_path)
            .and_then(|path| ConfigFile::read(&path).ok())
            .unwrap_or_default();

        Ok(Self {
            api_key: env(API_KEY_VAR).map(|key| key.trim().to_string()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            history_path: history_path(env(HISTORY_PATH_VAR), file.history_path)?,
            max_turns: DEFAULT_MAX_TURNS,
            system_prompt: env(SYSTEM_PROMPT_VAR)
                .or(file.system_prompt)
                .filter(|prompt| !prompt.trim().is_empty()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_delays_secs: vec![2],
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns < 2 {
            return Err(ConfigError::InvalidValue {
                key: MAX_TURNS_VAR,
                value: self.max_turns.to_string(),
                reason: "must keep at least one exchange (2 turns)",
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: TIMEOUT_SECS_VAR,
                value: self.timeout_secs.to_string(),
                reason: "must be at least 1 second",
            });
        }
        Ok(())
    }

    /// Apply a per-invocation model override.
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        self
    }

    /// The credential, required before any request is made.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

fn history_path(
    from_env: Option<String>,
    from_file: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    match from_env.map(PathBuf::from).or(from_file) {
        Some(path) => Ok(path),
        None => Ok(dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(HISTORY_FILE_NAME)),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: "expected a non-negative integer",
    })
}
