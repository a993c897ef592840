use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where analyses are sent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Upload PDFs to the analysis gateway.
    #[default]
    Gateway,
    /// Extract text locally and call the chat-completions API.
    Direct,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Gateway => write!(f, "gateway"),
            Backend::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gateway" => Ok(Backend::Gateway),
            "direct" => Ok(Backend::Direct),
            other => Err(format!(
                "unknown backend '{other}' (expected 'gateway' or 'direct')"
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the analysis gateway (e.g., "http://127.0.0.1:5000")
    pub gateway_url: Option<String>,
    /// Base URL of the chat-completions API, without `/chat/completions`
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub backend: Option<Backend>,
    /// Question sent with every PDF
    pub instruction: Option<String>,
    /// System prompt for chat sessions
    pub system_prompt: Option<String>,
    /// Highlight dates, badge ids and alert keywords in HTML reports
    pub highlights: Option<bool>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/tracelens/config.toml` → `~/.config/tracelens/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
