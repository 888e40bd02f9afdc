use config::{Config, ConfigError, Environment, File, FileFormat};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ExtractionError;
use crate::gateway::MetadataGateway;
use crate::model::{Credentials, GenerationOptions, ModelId, Provider};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Model identifier used when none is given (e.g. "gpt4o-mini")
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Default generation parameters
    #[serde(default)]
    pub generation: GenerationOptions,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Configuration for a specific AI provider
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// API key for authentication (can also be set via the provider's
    /// conventional environment variable, e.g. OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

fn default_model() -> String {
    ModelId::Gpt4oMini.as_str().to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_model: default_model(),
            timeout: default_timeout(),
            generation: GenerationOptions::default(),
            providers: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with PAPER_METADATA__ prefix
    /// 2. The given file, or paper-metadata.toml in the current directory
    /// 3. Default values
    ///
    /// Environment variable format: PAPER_METADATA__PROVIDERS__OPENAI__API_KEY
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("paper-metadata").required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("PAPER_METADATA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse configuration from TOML text, without consulting the environment
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// The configured default model
    pub fn model(&self) -> Result<ModelId, ExtractionError> {
        self.default_model.parse()
    }

    /// Collect API keys: the config value when set, otherwise the provider's
    /// conventional environment variable
    pub fn credentials(&self) -> Credentials {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Same as [`credentials`](Self::credentials) with a custom variable lookup
    pub fn credentials_with<F>(&self, lookup: F) -> Credentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = Credentials::new();

        for provider in Provider::ALL {
            let key = self
                .providers
                .get(provider.as_str())
                .and_then(|p| p.api_key.clone())
                .filter(|k| !k.trim().is_empty())
                .or_else(|| lookup(provider.env_key()));

            if let Some(key) = key {
                credentials.insert(provider, key);
            }
        }

        credentials
    }

    /// Build a gateway honouring the timeout, base URLs and generation defaults
    pub fn gateway(&self) -> Result<MetadataGateway, reqwest::Error> {
        let mut builder = MetadataGateway::builder()
            .timeout(Duration::from_secs(self.timeout))
            .default_options(self.generation.clone());

        for (name, provider_config) in &self.providers {
            let provider = match name.parse::<Provider>() {
                Ok(provider) => provider,
                Err(e) => {
                    warn!("Ignoring provider configuration: {}", e);
                    continue;
                }
            };
            if let Some(base_url) = &provider_config.base_url {
                builder = builder.base_url(provider, base_url.clone());
            }
        }

        builder.build()
    }
}
