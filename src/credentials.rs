//! Provider credential resolution
//!
//! API keys are injected, never configured: resolution checks the
//! environment first and falls back to the system keyring. Nothing in
//! this crate ever writes a key to a config file or log line.

use crate::error::{ChatlingError, Result};
use keyring::Entry;

/// Keyring service name for stored credentials
const KEYRING_SERVICE: &str = "chatling";

/// Environment variable consulted before the keyring
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Where a resolved credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Found in the process environment
    Environment,
    /// Found in the system keyring
    Keyring,
}

/// Resolve the API key for a provider
///
/// Checks `OPENROUTER_API_KEY` first, then the system keyring entry for
/// the provider.
///
/// # Errors
///
/// Returns `ChatlingError::MissingCredentials` when neither source
/// holds a key
pub fn resolve_api_key(provider: &str) -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            return Ok(key.trim().to_string());
        }
    }

    if let Ok(entry) = Entry::new(KEYRING_SERVICE, provider) {
        if let Ok(key) = entry.get_password() {
            if !key.is_empty() {
                tracing::debug!("Using API key from system keyring");
                return Ok(key);
            }
        }
    }

    Err(ChatlingError::MissingCredentials(provider.to_string()).into())
}

/// Report where a key for the provider would be resolved from
pub fn credential_status(provider: &str) -> Option<CredentialSource> {
    if std::env::var(API_KEY_ENV).map(|k| !k.trim().is_empty()) == Ok(true) {
        return Some(CredentialSource::Environment);
    }
    match Entry::new(KEYRING_SERVICE, provider) {
        Ok(entry) => match entry.get_password() {
            Ok(key) if !key.is_empty() => Some(CredentialSource::Keyring),
            _ => None,
        },
        Err(_) => None,
    }
}

/// Store an API key for a provider in the system keyring
///
/// # Errors
///
/// Returns `ChatlingError::InvalidInput` for an empty key, or the
/// underlying keyring error when storage fails
pub fn store_api_key(provider: &str, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ChatlingError::InvalidInput("API key must not be empty".to_string()).into());
    }
    let entry = Entry::new(KEYRING_SERVICE, provider)?;
    entry.set_password(key)?;
    tracing::info!("Stored API key for provider {} in system keyring", provider);
    Ok(())
}

/// Remove a provider's API key from the system keyring (best-effort)
///
/// An entry that is already gone is not an error; keyring trouble is
/// logged and swallowed so `auth clear` always succeeds locally.
pub fn clear_api_key(provider: &str) {
    match Entry::new(KEYRING_SERVICE, provider) {
        Ok(entry) => {
            if let Err(e) = entry.delete_password() {
                tracing::warn!("Failed to clear stored API key: {}", e);
            } else {
                tracing::info!("Cleared stored API key for provider {}", provider);
            }
        }
        Err(e) => {
            tracing::warn!("Keyring not available while clearing API key: {}", e);
        }
    }
}
