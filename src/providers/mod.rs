//! Provider module for Chatling
//!
//! This module contains the chat-completion provider abstraction, the
//! OpenRouter implementation, and the retry policy shared by providers.

pub mod base;
pub mod openrouter;
pub mod retry;

pub use base::{CompletionResponse, Provider, TokenUsage, WireMessage};
pub use openrouter::{OpenRouterProvider, APOLOGY_REPLY};
pub use retry::{AttemptFailure, RetryPolicy};

use crate::error::Result;
use std::sync::Arc;

/// Create a provider instance based on configuration
///
/// The seam is provider-agnostic on purpose: the rest of the crate only
/// sees `Arc<dyn Provider>`, so additional backends slot in here.
///
/// # Arguments
///
/// * `provider_type` - Type of provider (currently "openrouter")
/// * `config` - Provider configuration
/// * `api_key` - Credential resolved from the keyring or environment
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(
    provider_type: &str,
    config: &crate::config::ProviderConfig,
    api_key: String,
) -> Result<Arc<dyn Provider>> {
    match provider_type {
        "openrouter" => Ok(Arc::new(OpenRouterProvider::new(
            config.openrouter.clone(),
            api_key,
        )?)),
        _ => Err(crate::error::ChatlingError::Provider(format!(
            "Unknown provider type: {}",
            provider_type
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn test_create_provider_openrouter() {
        let config = ProviderConfig::default();
        let provider = create_provider("openrouter", &config, "sk-test".to_string());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model(), config.openrouter.model);
    }

    #[test]
    fn test_create_provider_unknown_type() {
        let config = ProviderConfig::default();
        let result = create_provider("carrier-pigeon", &config, "sk-test".to_string());
        assert!(result.is_err());
    }
}
