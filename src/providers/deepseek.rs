use crate::error::ExtractionError;
use crate::model::Provider;
use crate::providers::open_ai::chat_completion;
use crate::providers::{CompletionRequest, LlmProvider};
use async_trait::async_trait;
use reqwest::Client;

/// DeepSeek speaks the OpenAI chat-completions protocol on its own host
pub struct DeepSeekProvider {
    client: Client,
    base_url: String,
}

impl DeepSeekProvider {
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        DeepSeekProvider { client, base_url }
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn provider(&self) -> Provider {
        Provider::DeepSeek
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractionError> {
        chat_completion(&self.client, Provider::DeepSeek, &self.base_url, request).await
    }
}
