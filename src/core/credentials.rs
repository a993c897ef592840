//! API key lookup: environment first, then the system keyring.

use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

use crate::core::constants::API_KEY_ENV_VAR;

const KEYRING_SERVICE: &str = "tracelens";
const KEYRING_ACCOUNT: &str = "chat-completions";

/// Failures when reading or writing the stored key.
///
/// Recoverable errors mean the platform keyring was temporarily unavailable
/// (locked keychain, missing secret service). Permanent errors carry the
/// underlying cause.
#[derive(Debug)]
pub enum CredentialError {
    Missing,
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl CredentialError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CredentialError::Recoverable(_))
    }
}

impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                CredentialError::Recoverable(err)
            }
            other => CredentialError::Permanent(other),
        }
    }
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Missing => write!(
                f,
                "No API key configured. Set {API_KEY_ENV_VAR} or run `tracelens auth set`."
            ),
            CredentialError::Recoverable(err) => write!(f, "Keyring unavailable: {err}"),
            CredentialError::Permanent(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialError::Missing => None,
            CredentialError::Recoverable(err) | CredentialError::Permanent(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Keyring,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment ({API_KEY_ENV_VAR})"),
            CredentialSource::Keyring => write!(f, "system keyring"),
        }
    }
}

pub struct CredentialStore {
    use_keyring: bool,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self { use_keyring: true }
    }

    /// Store that never touches the platform keyring.
    pub fn env_only() -> Self {
        Self { use_keyring: false }
    }

    pub fn resolve(&self) -> Result<(String, CredentialSource), CredentialError> {
        self.resolve_with(std::env::var(API_KEY_ENV_VAR).ok())
    }

    fn resolve_with(
        &self,
        env_value: Option<String>,
    ) -> Result<(String, CredentialSource), CredentialError> {
        if let Some(key) = env_value.filter(|key| !key.trim().is_empty()) {
            debug!("using API key from environment");
            return Ok((key.trim().to_string(), CredentialSource::Environment));
        }
        match self.get()? {
            Some(key) => Ok((key, CredentialSource::Keyring)),
            None => Err(CredentialError::Missing),
        }
    }

    pub fn get(&self) -> Result<Option<String>, CredentialError> {
        if !self.use_keyring {
            return Ok(None);
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
        match entry.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn store(&self, api_key: &str) -> Result<(), CredentialError> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
        entry.set_password(api_key.trim())?;
        Ok(())
    }

    /// Returns whether a key was removed.
    pub fn clear(&self) -> Result<bool, CredentialError> {
        if !self.use_keyring {
            return Ok(false);
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Show the first and last four characters of a key. Keys of eight
/// characters or fewer are fully starred.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
