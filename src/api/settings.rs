//! Client for the gateway's `api/api-key` settings endpoint.

use std::fmt;

use tracing::debug;

use crate::api::{ApiKeyStatus, ApiKeyUpdate};
use crate::utils::url::construct_api_url;

const API_KEY_ENDPOINT: &str = "api/api-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Rejected before any request is made.
    BlankKey,
    Transport(String),
    Status { status: u16, body: String },
    /// The gateway answered `{"status": "error", "message": ...}`.
    Rejected(String),
    Decode(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::BlankKey => write!(f, "Please enter a valid API key"),
            SettingsError::Transport(message) => write!(f, "Gateway unreachable: {message}"),
            SettingsError::Status { status, body } => {
                write!(f, "Gateway returned HTTP {status}: {body}")
            }
            SettingsError::Rejected(message) => write!(f, "Gateway rejected the key: {message}"),
            SettingsError::Decode(message) => {
                write!(f, "Unexpected gateway response: {message}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

pub async fn fetch_api_key_status(
    client: &reqwest::Client,
    gateway_url: &str,
) -> Result<ApiKeyStatus, SettingsError> {
    let url = construct_api_url(gateway_url, API_KEY_ENDPOINT);
    debug!(%url, "fetching gateway key status");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| SettingsError::Transport(err.to_string()))?;
    read_status(response).await
}

pub async fn update_api_key(
    client: &reqwest::Client,
    gateway_url: &str,
    api_key: &str,
) -> Result<ApiKeyStatus, SettingsError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(SettingsError::BlankKey);
    }

    let url = construct_api_url(gateway_url, API_KEY_ENDPOINT);
    debug!(%url, "updating gateway key");
    let response = client
        .post(url)
        .json(&ApiKeyUpdate { api_key })
        .send()
        .await
        .map_err(|err| SettingsError::Transport(err.to_string()))?;
    read_status(response).await
}

async fn read_status(response: reqwest::Response) -> Result<ApiKeyStatus, SettingsError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| SettingsError::Transport(err.to_string()))?;
    let parsed = serde_json::from_str::<ApiKeyStatus>(&body);

    match parsed {
        Ok(key_status) if key_status.status == "error" => Err(SettingsError::Rejected(
            key_status
                .message
                .unwrap_or_else(|| "unknown error".to_string()),
        )),
        Ok(key_status) if status.is_success() => Ok(key_status),
        Ok(_) => Err(SettingsError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(_) if !status.is_success() => Err(SettingsError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(err) => Err(SettingsError::Decode(err.to_string())),
    }
}
