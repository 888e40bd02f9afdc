//! Bibliographic metadata extraction for scientific articles.
//!
//! Feed the text of an article's first pages to one of several LLM providers
//! and get back a [`MetadataRecord`] with title, authors, year and keywords.
//!
//! ```no_run
//! use paper_metadata::{Credentials, MetadataGateway, Provider};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = MetadataGateway::new();
//! let credentials = Credentials::new().with(Provider::OpenAI, "sk-...");
//!
//! let record = gateway
//!     .extract("Deep Learning for X. A. Smith, B. Jones. 2021.", "gpt4o-mini", &credentials, None)
//!     .await?;
//! println!("{} ({})", record.title, record.year);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod parser;
pub mod providers;
pub mod text;

pub use batch::{BatchEntry, BatchItem};
pub use config::AppConfig;
pub use error::{ErrorKind, ExtractionError};
pub use gateway::{Extraction, GatewayBuilder, MetadataGateway};
pub use model::{Credentials, GenerationOptions, MetadataRecord, ModelId, Provider, UNKNOWN};
pub use parser::ParseStrategy;

/// Extract metadata with a default gateway.
///
/// Convenience for one-off calls; reuse a [`MetadataGateway`] for batches so
/// connections are pooled.
pub async fn extract_metadata(
    text: &str,
    model: &str,
    credentials: &Credentials,
) -> Result<MetadataRecord, ExtractionError> {
    MetadataGateway::new()
        .extract(text, model, credentials, None)
        .await
}
