use crate::error::ExtractionError;
use crate::model::Provider;
use crate::providers::{non_empty, send_json, CompletionRequest, LlmProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAIProvider {
    client: Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        OpenAIProvider { client, base_url }
    }
}

/// POST to an OpenAI-compatible `/v1/chat/completions` endpoint and return
/// `choices[0].message.content`
pub(crate) async fn chat_completion(
    client: &Client,
    provider: Provider,
    base_url: &str,
    request: &CompletionRequest<'_>,
) -> Result<String, ExtractionError> {
    let mut body = json!({
        "model": request.model,
        "messages": [
            {"role": "system", "content": request.instructions},
            {"role": "user", "content": request.text}
        ],
        "temperature": request.options.temperature,
        "max_tokens": request.options.max_tokens
    });
    if let Some(top_p) = request.options.top_p {
        body["top_p"] = json!(top_p);
    }

    let http_request = client
        .post(format!("{}/v1/chat/completions", base_url.trim_end_matches('/')))
        .bearer_auth(request.api_key)
        .json(&body);

    let envelope: ChatCompletionResponse = send_json(provider, http_request).await?;
    let content = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    non_empty(provider, content)
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractionError> {
        chat_completion(&self.client, Provider::OpenAI, &self.base_url, request).await
    }
}
