use serde::Serialize;
use thiserror::Error;

use crate::model::Provider;

/// Errors that can occur while extracting metadata from an article
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The caller supplied unusable input (e.g. blank text)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model identifier is not one of the supported tags
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// No API key is configured for the provider the model needs
    #[error("Missing API key for provider '{0}'")]
    MissingCredential(Provider),

    /// The request never produced an HTTP response (connect, TLS, timeout)
    #[error("Transport error calling {provider}: {source}")]
    TransportError {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with an error status or an unreadable envelope
    #[error("{provider} returned HTTP {status}: {body}")]
    ProviderError {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The provider answered without any generated text
    #[error("Empty response from {0}")]
    EmptyResponse(Provider),

    /// The generated text did not contain a usable metadata object
    #[error("Could not parse metadata from model output: {0}")]
    MalformedResponse(String),

    /// The caller cancelled the request before it completed
    #[error("Extraction cancelled")]
    Cancelled,
}

/// Fieldless mirror of [`ExtractionError`] for reporting at the UI boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedModel,
    MissingCredential,
    TransportError,
    ProviderError,
    EmptyResponse,
    MalformedResponse,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UnsupportedModel => "unsupported_model",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::InvalidInput(_) => ErrorKind::InvalidInput,
            ExtractionError::UnsupportedModel(_) => ErrorKind::UnsupportedModel,
            ExtractionError::MissingCredential(_) => ErrorKind::MissingCredential,
            ExtractionError::TransportError { .. } => ErrorKind::TransportError,
            ExtractionError::ProviderError { .. } => ErrorKind::ProviderError,
            ExtractionError::EmptyResponse(_) => ErrorKind::EmptyResponse,
            ExtractionError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ExtractionError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether the failure was detected before any network I/O
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ExtractionError::InvalidInput(_)
                | ExtractionError::UnsupportedModel(_)
                | ExtractionError::MissingCredential(_)
        )
    }
}
