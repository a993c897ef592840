//! Handlers for `set`, `unset`, `config`, `auth` and `api-key`.
//!
//! Each handler returns the line to print so the wording can be tested
//! without capturing stdout.

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::api::settings::{fetch_api_key_status, update_api_key, SettingsError};
use crate::core::config::data::{path_display, Config};
use crate::core::config::defaults::ConfigKeyError;
use crate::core::credentials::{mask_api_key, CredentialError, CredentialStore};

pub fn set_config_value(key: &str, value: &str) -> Result<String, Box<dyn Error>> {
    Config::mutate(|config| Ok(apply_set(config, key, value)?))
}

pub fn unset_config_value(key: &str) -> Result<String, Box<dyn Error>> {
    Config::mutate(|config| Ok(apply_unset(config, key)?))
}

/// Set `key` and describe the value as `tracelens config` would show it.
fn apply_set(config: &mut Config, key: &str, value: &str) -> Result<String, ConfigKeyError> {
    config.set_value(key, value)?;
    let normalized = key.trim().to_ascii_lowercase().replace('-', "_");
    let stored = config
        .describe_all()
        .into_iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, value)| value)
        .unwrap_or_else(|| value.to_string());
    Ok(format!("Set {key} to: {stored}"))
}

fn apply_unset(config: &mut Config, key: &str) -> Result<String, ConfigKeyError> {
    config.unset_value(key)?;
    Ok(format!("Unset {key}"))
}

pub fn show_config() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    println!("Config file: {}", path_display(Config::active_path()));
    config.print_all();
    Ok(())
}

/// Read a key from stdin after a prompt on stderr.
pub fn prompt_for_key() -> io::Result<String> {
    eprint!("Enter API key: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn store_key(store: &CredentialStore, key: &str) -> Result<String, CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::Missing);
    }
    store.store(key)?;
    Ok(format!("✅ Stored API key {}", mask_api_key(key)))
}

pub fn clear_key(store: &CredentialStore) -> Result<String, CredentialError> {
    Ok(if store.clear()? {
        "✅ Removed the stored API key".to_string()
    } else {
        "No stored API key to remove".to_string()
    })
}

pub fn key_status(store: &CredentialStore) -> String {
    match store.resolve() {
        Ok((key, source)) => format!("Using API key {} from {source}", mask_api_key(&key)),
        Err(CredentialError::Missing) => CredentialError::Missing.to_string(),
        Err(err) if err.is_recoverable() => {
            format!("⚠️  {err}. Set the key through the environment instead.")
        }
        Err(err) => format!("❌ {err}"),
    }
}

pub async fn show_gateway_key(
    client: &reqwest::Client,
    gateway_url: &str,
) -> Result<String, SettingsError> {
    let status = fetch_api_key_status(client, gateway_url).await?;
    Ok(match status.masked_key.filter(|key| !key.is_empty()) {
        Some(masked) => format!("Gateway API key: {masked}"),
        None => "Gateway has no API key configured".to_string(),
    })
}

pub async fn set_gateway_key(
    client: &reqwest::Client,
    gateway_url: &str,
    key: &str,
) -> Result<String, SettingsError> {
    let status = update_api_key(client, gateway_url, key).await?;
    Ok(match status.masked_key {
        Some(masked) => format!("✅ Gateway API key updated: {masked}"),
        None => "✅ Gateway API key updated".to_string(),
    })
}
