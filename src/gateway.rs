use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde::Serialize;

use crate::error::ExtractionError;
use crate::model::{Credentials, GenerationOptions, MetadataRecord, ModelId, Provider};
use crate::parser::{parse_metadata, ParseStrategy};
use crate::providers::{CompletionRequest, ProviderFactory, METADATA_EXTRACTION_PROMPT};
use crate::text::{truncate_words, MAX_WORDS};

/// Successful extraction together with how it was obtained
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub record: MetadataRecord,
    #[serde(serialize_with = "serialize_model")]
    pub model: ModelId,
    pub provider: Provider,
    /// Which JSON recovery step produced the record
    pub strategy: ParseStrategy,
    /// Generated text as returned by the provider
    pub raw_text: String,
}

fn serialize_model<S: serde::Serializer>(model: &ModelId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(model.as_str())
}

/// Validated inputs of a single call, produced before any I/O
struct Prepared<'a> {
    text: String,
    model: ModelId,
    api_key: &'a str,
}

/// Metadata Extraction Gateway.
///
/// Stateless across calls: each `extract` validates its inputs, sends one
/// request to the provider behind the chosen model and parses the reply.
/// Calls may run concurrently; nothing is shared between them except the
/// HTTP connection pool.
#[derive(Debug, Clone)]
pub struct MetadataGateway {
    client: Client,
    base_urls: HashMap<Provider, String>,
    default_options: GenerationOptions,
}

impl Default for MetadataGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataGateway {
    /// Gateway against the public provider endpoints with default options
    pub fn new() -> Self {
        MetadataGateway {
            client: Client::new(),
            base_urls: HashMap::new(),
            default_options: GenerationOptions::default(),
        }
    }

    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Extract a metadata record from article text.
    ///
    /// Preconditions are checked in order before any network call: non-blank
    /// text, a supported model identifier, a key for the model's provider.
    /// `options` falls back to the gateway defaults.
    pub async fn extract(
        &self,
        text: &str,
        model: impl AsRef<str>,
        credentials: &Credentials,
        options: Option<&GenerationOptions>,
    ) -> Result<MetadataRecord, ExtractionError> {
        self.extract_detailed(text, model, credentials, options)
            .await
            .map(|extraction| extraction.record)
    }

    /// Like [`extract`](Self::extract) but also reports the provider, the raw
    /// generated text and the JSON recovery step that succeeded.
    pub async fn extract_detailed(
        &self,
        text: &str,
        model: impl AsRef<str>,
        credentials: &Credentials,
        options: Option<&GenerationOptions>,
    ) -> Result<Extraction, ExtractionError> {
        let prepared = prepare(text, model.as_ref(), credentials)?;
        self.dispatch(prepared, options.unwrap_or(&self.default_options))
            .await
    }

    /// Like [`extract_detailed`](Self::extract_detailed), but gives up with
    /// `Cancelled` as soon as `cancel` resolves. No partial record is returned.
    pub async fn extract_with_cancel<F>(
        &self,
        text: &str,
        model: impl AsRef<str>,
        credentials: &Credentials,
        options: Option<&GenerationOptions>,
        cancel: F,
    ) -> Result<Extraction, ExtractionError>
    where
        F: Future<Output = ()>,
    {
        let prepared = prepare(text, model.as_ref(), credentials)?;
        let model = prepared.model;

        tokio::select! {
            biased;
            _ = cancel => {
                info!("Extraction with {} cancelled", model);
                Err(ExtractionError::Cancelled)
            }
            result = self.dispatch(prepared, options.unwrap_or(&self.default_options)) => result,
        }
    }

    async fn dispatch(
        &self,
        prepared: Prepared<'_>,
        options: &GenerationOptions,
    ) -> Result<Extraction, ExtractionError> {
        let model = prepared.model;
        let provider = model.provider();
        let adapter =
            ProviderFactory::create(provider, self.client.clone(), self.base_urls.get(&provider).cloned());

        let request = CompletionRequest {
            instructions: METADATA_EXTRACTION_PROMPT,
            text: &prepared.text,
            model: model.upstream_model(),
            api_key: prepared.api_key,
            options,
        };
        debug!(
            "Sending {} chars to {} ({})",
            prepared.text.len(),
            provider,
            model.upstream_model()
        );

        let raw_text = adapter.complete(&request).await?;
        let (record, strategy) = parse_metadata(&raw_text)?;

        if strategy != ParseStrategy::Direct {
            warn!(
                "{} did not return bare JSON, recovered via {:?}",
                provider, strategy
            );
        }
        info!("Extracted metadata with {} ({})", model, provider);

        Ok(Extraction {
            record,
            model,
            provider,
            strategy,
            raw_text,
        })
    }
}

fn prepare<'a>(
    text: &str,
    model: &str,
    credentials: &'a Credentials,
) -> Result<Prepared<'a>, ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::InvalidInput("no text supplied".to_string()));
    }

    let model: ModelId = model.parse()?;

    let api_key = credentials
        .get(model.provider())
        .ok_or(ExtractionError::MissingCredential(model.provider()))?;

    Ok(Prepared {
        text: truncate_words(text, MAX_WORDS),
        model,
        api_key,
    })
}

/// Builder for configuring a [`MetadataGateway`]
#[derive(Debug, Default)]
pub struct GatewayBuilder {
    client: Option<Client>,
    timeout: Option<Duration>,
    base_urls: HashMap<Provider, String>,
    options: Option<GenerationOptions>,
}

impl GatewayBuilder {
    /// Set a timeout for each provider request.
    ///
    /// A request exceeding it fails with `TransportError`.
    ///
    /// # Example
    /// ```
    /// use paper_metadata::MetadataGateway;
    /// use std::time::Duration;
    ///
    /// let gateway = MetadataGateway::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Send requests for `provider` to a different host (proxy, test server)
    ///
    /// # Example
    /// ```
    /// use paper_metadata::{MetadataGateway, Provider};
    ///
    /// let gateway = MetadataGateway::builder()
    ///     .base_url(Provider::OpenAI, "http://localhost:8080")
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn base_url(mut self, provider: Provider, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider, url.into());
        self
    }

    /// Generation parameters used when a call passes none
    pub fn default_options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Use a preconfigured HTTP client. Takes precedence over `timeout`.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<MetadataGateway, reqwest::Error> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(MetadataGateway {
            client,
            base_urls: self.base_urls,
            default_options: self.options.unwrap_or_default(),
        })
    }
}
