use crate::model::Provider;
use crate::providers::{
    AnthropicProvider, DeepSeekProvider, GoogleProvider, LlmProvider, OpenAIProvider,
};
use reqwest::Client;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the adapter for `provider`, optionally against a custom base URL
    pub fn create(
        provider: Provider,
        client: Client,
        base_url: Option<String>,
    ) -> Box<dyn LlmProvider> {
        let base_url = base_url.unwrap_or_else(|| provider.default_base_url().to_string());

        match provider {
            Provider::OpenAI => Box::new(OpenAIProvider::with_base_url(client, base_url)),
            Provider::Anthropic => Box::new(AnthropicProvider::with_base_url(client, base_url)),
            Provider::DeepSeek => Box::new(DeepSeekProvider::with_base_url(client, base_url)),
            Provider::Google => Box::new(GoogleProvider::with_base_url(client, base_url)),
        }
    }
}
