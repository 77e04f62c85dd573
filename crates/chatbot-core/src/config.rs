use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const BASE_URL_ENV: &str = "GEMINI_API_BASE";

const CONFIG_FILE: &str = "config.json";

/// On-disk configuration. Every field is optional; environment variables
/// take precedence over whatever the file says.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Fully resolved settings for the completion client.
#[derive(Debug)]
pub struct ClientSettings {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl Config {
    /// Load `<config_dir>/chatbot/config.json`, returning the config and the
    /// path it was looked up at. A missing file yields defaults.
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        Self::load_in(dirs::config_dir().as_deref())
    }

    /// Like [`Config::load`] with an explicit config directory. Without one
    /// there is no file to read, so only defaults and the environment apply.
    pub fn load_in(config_dir: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let Some(dir) = config_dir else {
            tracing::warn!("no config directory, using defaults and environment");
            return Ok((Self::default(), PathBuf::from(CONFIG_FILE)));
        };

        let path = dir.join("chatbot").join(CONFIG_FILE);
        let config = Self::load_from(&path)?;
        Ok((config, path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge with the process environment.
    pub fn resolve(self, source: &Path) -> Result<ClientSettings, ConfigError> {
        self.resolve_with(source, |key| std::env::var(key).ok())
    }

    /// Merge with an arbitrary variable lookup. `source` only feeds the
    /// missing-key error message.
    pub fn resolve_with<F>(self, source: &Path, lookup: F) -> Result<ClientSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: String| {
            let v = v.trim().to_string();
            (!v.is_empty()).then_some(v)
        };

        let api_key = lookup(API_KEY_ENV)
            .and_then(non_empty)
            .or_else(|| self.api_key.and_then(non_empty))
            .ok_or_else(|| ConfigError::MissingApiKey(source.to_path_buf()))?;

        let model = lookup(MODEL_ENV)
            .and_then(non_empty)
            .or_else(|| self.model.and_then(non_empty))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = lookup(BASE_URL_ENV)
            .and_then(non_empty)
            .or_else(|| self.base_url.and_then(non_empty))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(ClientSettings {
            api_key: SecretString::from(api_key),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}
