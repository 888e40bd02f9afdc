use crate::error::ExtractionError;
use crate::model::Provider;
use crate::providers::{
    inline_prompt, non_empty, send_json_with_status, CompletionRequest, LlmProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// --- Gemini request and response structures ---

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: GenerationConfig<'a>,
    safety_settings: Vec<SafetySetting<'a>>,
}

#[derive(Serialize, Debug)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    response_mime_type: &'a str,
}

#[derive(Serialize, Debug)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

/// Google Gemini `generateContent` adapter
pub struct GoogleProvider {
    client: Client,
    base_url: String,
}

impl GoogleProvider {
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        GoogleProvider { client, base_url }
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractionError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            request.model
        );

        // Gemini takes the instructions and the article as a single prompt
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: inline_prompt(request.instructions, request.text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.options.temperature,
                max_output_tokens: request.options.max_tokens,
                top_p: request.options.top_p,
                top_k: request.options.top_k,
                response_mime_type: "application/json",
            },
            safety_settings: HARM_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        };

        // The key must stay out of the URL: transport errors print it
        let http_request = self
            .client
            .post(&url)
            .header("x-goog-api-key", request.api_key)
            .json(&body);

        let (status, envelope): (u16, GenerateContentResponse) =
            send_json_with_status(Provider::Google, http_request).await?;

        if let Some(error) = envelope.error {
            return Err(ExtractionError::ProviderError {
                provider: Provider::Google,
                status: error.code.unwrap_or(status),
                body: error.message,
            });
        }

        // Equivalent of the SDK's `response.text()`: all text parts of the first candidate
        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            });

        non_empty(Provider::Google, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GenerationOptions;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn request<'a>(options: &'a GenerationOptions) -> CompletionRequest<'a> {
        CompletionRequest {
            instructions: "Return JSON\n",
            text: "article text",
            model: "gemini-2.0-flash",
            api_key: "google-key",
            options,
        }
    }

    #[tokio::test]
    async fn test_complete() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "google-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "maxOutputTokens": 500,
                    "responseMimeType": "application/json"
                },
                "safetySettings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                    {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                    {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [{"content": {"parts": [{"text": "{\"title\":"}, {"text": " \"A\"}"}]}}]}"#,
            )
            .create_async()
            .await;

        let provider = GoogleProvider::with_base_url(Client::new(), server.url());
        let options = GenerationOptions::default();

        let text = provider.complete(&request(&options)).await.unwrap();
        assert_eq!(text, r#"{"title": "A"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_prompt_and_text_are_sent_together() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex(r#""text":"Return JSON\\n\\narticle text""#.to_string()))
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "{}"}]}}]}"#)
            .create_async()
            .await;

        let provider = GoogleProvider::with_base_url(Client::new(), server.url());
        let options = GenerationOptions::default();

        provider.complete(&request(&options)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_object_in_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": {"code": 429, "message": "Resource exhausted"}}"#)
            .create_async()
            .await;

        let provider = GoogleProvider::with_base_url(Client::new(), server.url());
        let options = GenerationOptions::default();

        let err = provider.complete(&request(&options)).await.unwrap_err();
        match err {
            ExtractionError::ProviderError { status, body, .. } => {
                assert_eq!(status, 429);
                assert_eq!(body, "Resource exhausted");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_object_without_code_uses_http_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"error": {"message": "Model overloaded"}}"#)
            .create_async()
            .await;

        let provider = GoogleProvider::with_base_url(Client::new(), server.url());
        let options = GenerationOptions::default();

        let err = provider.complete(&request(&options)).await.unwrap_err();
        match err {
            ExtractionError::ProviderError { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body, "Model overloaded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_key_stays_out_of_url_and_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Exact(String::new()))
            .match_header("x-goog-api-key", "google-key")
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "{}"}]}}]}"#)
            .create_async()
            .await;

        let provider = GoogleProvider::with_base_url(Client::new(), server.url());
        let options = GenerationOptions::default();
        provider.complete(&request(&options)).await.unwrap();
        mock.assert_async().await;

        // Unreachable host: the transport error must not carry the key
        let provider = GoogleProvider::with_base_url(Client::new(), "http://127.0.0.1:9".to_string());
        let mut secret = request(&options);
        secret.api_key = "SECRET-GOOGLE-KEY";

        let err = provider.complete(&secret).await.unwrap_err();
        assert!(matches!(err, ExtractionError::TransportError { .. }));
        assert!(!err.to_string().contains("SECRET-GOOGLE-KEY"));
        assert!(!format!("{:?}", err).contains("SECRET-GOOGLE-KEY"));
    }

    #[tokio::test]
    async fn test_blocked_candidate_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#)
            .create_async()
            .await;

        let provider = GoogleProvider::with_base_url(Client::new(), server.url());
        let options = GenerationOptions::default();

        let err = provider.complete(&request(&options)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyResponse(Provider::Google)));
    }
}
