use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::ExtractionError;

/// Placeholder the model uses for any field it cannot determine reliably.
pub const UNKNOWN: &str = "Desconocido";

/// Upstream AI vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    DeepSeek,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::OpenAI,
        Provider::Anthropic,
        Provider::DeepSeek,
        Provider::Google,
    ];

    /// Name used as the credentials key and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::DeepSeek => "deepseek",
            Provider::Google => "google",
        }
    }

    /// Conventional environment variable holding this provider's key
    pub fn env_key(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::DeepSeek => "https://api.deepseek.com",
            Provider::Google => "https://generativelanguage.googleapis.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Model variant selected by the caller. Each identifier maps to exactly one
/// provider and one upstream model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    Gpt4o,
    Gpt4oMini,
    Sonnet,
    DeepSeek,
    Gemini25Pro,
    Gemini20Flash,
}

impl ModelId {
    pub const ALL: [ModelId; 6] = [
        ModelId::Gpt4o,
        ModelId::Gpt4oMini,
        ModelId::Sonnet,
        ModelId::DeepSeek,
        ModelId::Gemini25Pro,
        ModelId::Gemini20Flash,
    ];

    /// Canonical identifier tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "gpt4o",
            ModelId::Gpt4oMini => "gpt4o-mini",
            ModelId::Sonnet => "sonnet",
            ModelId::DeepSeek => "deepseek",
            ModelId::Gemini25Pro => "gemini-2.5-pro",
            ModelId::Gemini20Flash => "gemini-2.0-flash",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ModelId::Gpt4o | ModelId::Gpt4oMini => Provider::OpenAI,
            ModelId::Sonnet => Provider::Anthropic,
            ModelId::DeepSeek => Provider::DeepSeek,
            ModelId::Gemini25Pro | ModelId::Gemini20Flash => Provider::Google,
        }
    }

    /// Model name sent to the provider's API
    pub fn upstream_model(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Sonnet => "claude-3-sonnet-20240229",
            ModelId::DeepSeek => "deepseek-chat",
            ModelId::Gemini25Pro => "gemini-2.5-pro",
            ModelId::Gemini20Flash => "gemini-2.0-flash",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "GPT-4o",
            ModelId::Gpt4oMini => "GPT-4o Mini",
            ModelId::Sonnet => "Claude Sonnet",
            ModelId::DeepSeek => "DeepSeek",
            ModelId::Gemini25Pro => "Gemini 2.5 Pro",
            ModelId::Gemini20Flash => "Gemini 2.0 Flash",
        }
    }

    /// Advertised context window in tokens. Informational only: the input is
    /// always cut to the same word budget regardless of model.
    pub fn context_window(&self) -> u32 {
        match self {
            ModelId::Gpt4o => 128_000,
            ModelId::Gpt4oMini => 32_000,
            ModelId::Sonnet => 200_000,
            ModelId::DeepSeek => 32_000,
            ModelId::Gemini25Pro | ModelId::Gemini20Flash => 1_048_576,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for ModelId {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ExtractionError::UnsupportedModel(s.to_string()))
    }
}

/// API keys keyed by provider name (`openai`, `anthropic`, `deepseek`, `google`)
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    keys: HashMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the key for a provider
    pub fn with(mut self, provider: Provider, api_key: impl Into<String>) -> Self {
        self.insert(provider, api_key);
        self
    }

    pub fn insert(&mut self, provider: Provider, api_key: impl Into<String>) {
        self.keys
            .insert(provider.as_str().to_string(), api_key.into());
    }

    /// The key for `provider`, if present and not blank
    pub fn get(&self, provider: Provider) -> Option<&str> {
        self.keys
            .get(provider.as_str())
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }

    /// Whether a usable key is configured for each provider
    pub fn status(&self) -> BTreeMap<Provider, bool> {
        Provider::ALL
            .into_iter()
            .map(|p| (p, self.get(p).is_some()))
            .collect()
    }
}

impl From<HashMap<String, String>> for Credentials {
    fn from(keys: HashMap<String, String>) -> Self {
        Credentials { keys }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Credentials")
            .field("providers", &names)
            .finish_non_exhaustive()
    }
}

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: None,
            top_k: None,
        }
    }
}

/// Bibliographic metadata extracted from an article.
///
/// Every field is always present; fields the model could not determine hold
/// [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    /// Full author names, comma separated
    pub authors: String,
    /// Four digit publication year, kept as text
    pub year: String,
    /// Keywords, comma separated
    pub keywords: String,
}

impl MetadataRecord {
    /// Filename of the form `{year}-{authors}-{title}.pdf`, with every
    /// character outside `[A-Za-z0-9]` replaced by `_`.
    ///
    /// Returns `None` if title, authors or year is empty.
    pub fn suggested_filename(&self) -> Option<String> {
        if self.title.is_empty() || self.authors.is_empty() || self.year.is_empty() {
            return None;
        }

        let title = sanitize_for_filename(&self.title, 50);
        let authors = sanitize_for_filename(&self.authors, 30);
        Some(format!("{}-{}-{}.pdf", self.year, authors, title))
    }
}

fn sanitize_for_filename(value: &str, max_chars: usize) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(max_chars)
        .collect()
}
