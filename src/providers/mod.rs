mod anthropic;
mod deepseek;
mod factory;
mod google;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use deepseek::DeepSeekProvider;
pub use factory::ProviderFactory;
pub use google::GoogleProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{inline_prompt, METADATA_EXTRACTION_PROMPT};

use async_trait::async_trait;
use log::debug;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::error::ExtractionError;
use crate::model::{GenerationOptions, Provider};

/// Everything an adapter needs for one completion call
#[derive(Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Fixed extraction instructions
    pub instructions: &'a str,
    /// Article text, already truncated
    pub text: &'a str,
    /// Upstream model name (e.g. "gpt-4o-mini")
    pub model: &'a str,
    pub api_key: &'a str,
    pub options: &'a GenerationOptions,
}

impl fmt::Debug for CompletionRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("instructions", &self.instructions)
            .field("text", &self.text)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

/// Unified trait for all LLM providers.
///
/// An adapter performs exactly one HTTP POST and unwraps the provider's
/// envelope to the generated text. Failures are returned, never swallowed.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Send the request and return the raw generated text
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractionError>;
}

/// Send a prepared request and decode a successful JSON envelope.
///
/// Transport failures become `TransportError`, non-2xx statuses become
/// `ProviderError` with the response body, and a blank body is
/// `EmptyResponse`. A 2xx body that does not decode as `T` is reported as a
/// `ProviderError` carrying that body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T, ExtractionError> {
    send_json_with_status(provider, request)
        .await
        .map(|(_, envelope)| envelope)
}

/// Same as [`send_json`], also returning the (successful) HTTP status
pub(crate) async fn send_json_with_status<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<(u16, T), ExtractionError> {
    let response = request
        .send()
        .await
        .map_err(|source| ExtractionError::TransportError { provider, source })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ExtractionError::TransportError { provider, source })?;
    debug!("{} responded with {}: {}", provider, status, body);

    if !status.is_success() {
        return Err(ExtractionError::ProviderError {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse(provider));
    }

    match serde_json::from_str(&body) {
        Ok(envelope) => Ok((status.as_u16(), envelope)),
        Err(e) => {
            debug!("Failed to decode {} envelope: {}", provider, e);
            Err(ExtractionError::ProviderError {
                provider,
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Treat missing or blank generated text as an empty response
pub(crate) fn non_empty(provider: Provider, text: Option<String>) -> Result<String, ExtractionError> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or(ExtractionError::EmptyResponse(provider))
}
