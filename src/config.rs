//! Configuration management for Chatling
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Credentials are deliberately absent from this structure; they live in
//! the OS keyring or the environment (see `credentials`).

use crate::error::{ChatlingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Chatling
///
/// Holds provider settings, chat behavior, storage location, and proxy
/// server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Chat behavior configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Proxy server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider configuration
///
/// Specifies which completion provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// OpenRouter configuration
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

fn default_provider_type() -> String {
    "openrouter".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

/// OpenRouter provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// API base URL (overridable for tests and local mocks)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Value for the HTTP-Referer identification header
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Value for the X-Title identification header
    #[serde(default = "default_app_title")]
    pub app_title: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Optional cap on completion tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<usize>,

    /// Retry policy settings
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "meta-llama/llama-3-8b-instruct".to_string()
}

fn default_referer() -> String {
    "https://chatling.local".to_string()
}

fn default_app_title() -> String {
    "Chatling".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_tokens() -> Option<usize> {
    Some(4000)
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            referer: default_referer(),
            app_title: default_app_title(),
            timeout_seconds: default_timeout_seconds(),
            max_tokens: default_max_tokens(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy settings for transient completion failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempt budget, including the first attempt
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts, in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// System instruction prepended to every completion request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Greeting shown as the first assistant message of a conversation
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Sampling temperature; clamped to [0, 2] at the wire
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum characters per message; longer content is truncated
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_greeting() -> String {
    "Hello! I'm your AI assistant. How can I help you today?".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_content_length() -> usize {
    10_000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            greeting: default_greeting(),
            temperature: default_temperature(),
            max_content_length: default_max_content_length(),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory; defaults to the user's data directory
    #[serde(default)]
    pub path: Option<String>,
}

/// Proxy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from a file with environment and CLI overrides
    ///
    /// Missing files are not an error: defaults are used so the binary
    /// works out of the box.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments whose overrides are applied last
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Config` if the file exists but cannot be
    /// read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatlingError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatlingError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(model) = std::env::var("CHATLING_MODEL") {
            self.provider.openrouter.model = model;
        }

        if let Ok(api_base) = std::env::var("CHATLING_API_BASE") {
            self.provider.openrouter.api_base = api_base;
        }

        if let Ok(db_path) = std::env::var("CHATLING_HISTORY_DB") {
            self.storage.path = Some(db_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            self.storage.path = Some(db_path.clone());
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Config` describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(ChatlingError::Config("provider.type must not be empty".into()).into());
        }

        if self.provider.openrouter.api_base.is_empty() {
            return Err(
                ChatlingError::Config("provider.openrouter.api_base must not be empty".into())
                    .into(),
            );
        }

        if self.provider.openrouter.model.is_empty() {
            return Err(
                ChatlingError::Config("provider.openrouter.model must not be empty".into()).into(),
            );
        }

        if self.provider.openrouter.retry.max_attempts == 0 {
            return Err(ChatlingError::Config(
                "provider.openrouter.retry.max_attempts must be at least 1".into(),
            )
            .into());
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ChatlingError::Config(format!(
                "chat.temperature must be within [0, 2], got {}",
                self.chat.temperature
            ))
            .into());
        }

        if self.chat.max_content_length == 0 {
            return Err(
                ChatlingError::Config("chat.max_content_length must be positive".into()).into(),
            );
        }

        Ok(())
    }
}
