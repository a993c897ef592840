use std::fmt;

use crate::core::config::data::{Backend, Config};
use crate::core::constants::{
    DEFAULT_ANALYSIS_SYSTEM_PROMPT, DEFAULT_API_URL, DEFAULT_CHAT_SYSTEM_PROMPT,
    DEFAULT_GATEWAY_URL, DEFAULT_INSTRUCTION, DEFAULT_MODEL,
};

/// Keys accepted by `tracelens set` / `tracelens unset`.
pub const CONFIG_KEYS: [&str; 7] = [
    "gateway_url",
    "api_url",
    "model",
    "backend",
    "instruction",
    "system_prompt",
    "highlights",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKeyError {
    UnknownKey(String),
    InvalidValue { key: String, message: String },
}

impl fmt::Display for ConfigKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKeyError::UnknownKey(key) => write!(
                f,
                "Unknown config key '{key}'. Available keys: {}",
                CONFIG_KEYS.join(", ")
            ),
            ConfigKeyError::InvalidValue { key, message } => {
                write!(f, "Invalid value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigKeyError {}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn gateway_url(&self) -> &str {
        self.gateway_url.as_deref().unwrap_or(DEFAULT_GATEWAY_URL)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn instruction(&self) -> &str {
        self.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION)
    }

    pub fn chat_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_CHAT_SYSTEM_PROMPT)
    }

    pub fn analysis_system_prompt(&self) -> &str {
        DEFAULT_ANALYSIS_SYSTEM_PROMPT
    }

    pub fn highlights(&self) -> bool {
        self.highlights.unwrap_or(true)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigKeyError> {
        let key = normalize_key(key);
        let value = value.trim();
        let invalid = |message: String| ConfigKeyError::InvalidValue {
            key: key.clone(),
            message,
        };
        if value.is_empty() {
            return Err(invalid("value must not be empty".to_string()));
        }

        match key.as_str() {
            "gateway_url" | "api_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("expected an http:// or https:// URL".to_string()));
                }
                let slot = if key == "gateway_url" {
                    &mut self.gateway_url
                } else {
                    &mut self.api_url
                };
                *slot = Some(value.to_string());
            }
            "model" => self.model = Some(value.to_string()),
            "backend" => self.backend = Some(value.parse::<Backend>().map_err(invalid)?),
            "instruction" => self.instruction = Some(value.to_string()),
            "system_prompt" => self.system_prompt = Some(value.to_string()),
            "highlights" => {
                self.highlights = Some(
                    parse_bool(value).ok_or_else(|| invalid("expected on or off".to_string()))?,
                );
            }
            _ => return Err(ConfigKeyError::UnknownKey(key.clone())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigKeyError> {
        match normalize_key(key).as_str() {
            "gateway_url" => self.gateway_url = None,
            "api_url" => self.api_url = None,
            "model" => self.model = None,
            "backend" => self.backend = None,
            "instruction" => self.instruction = None,
            "system_prompt" => self.system_prompt = None,
            "highlights" => self.highlights = None,
            other => return Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}
