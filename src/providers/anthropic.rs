use crate::error::ExtractionError;
use crate::model::Provider;
use crate::providers::{non_empty, send_json, CompletionRequest, LlmProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    text: Option<String>,
}

pub struct AnthropicProvider {
    client: Client,
    base_url: String,
}

impl AnthropicProvider {
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        AnthropicProvider { client, base_url }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractionError> {
        let mut body = json!({
            "model": request.model,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "system": request.instructions,
            "messages": [
                {
                    "role": "user",
                    "content": request.text
                }
            ]
        });
        if let Some(top_p) = request.options.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(top_k) = request.options.top_k {
            body["top_k"] = json!(top_k);
        }

        let http_request = self
            .client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", request.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let envelope: MessagesResponse = send_json(Provider::Anthropic, http_request).await?;
        let text = envelope
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text);

        non_empty(Provider::Anthropic, text)
    }
}
