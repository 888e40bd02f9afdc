use log::{info, warn};
use serde::Serialize;

use crate::error::ErrorKind;
use crate::gateway::MetadataGateway;
use crate::model::{Credentials, GenerationOptions, MetadataRecord};

/// One document to analyse
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Name the result is reported under (usually the stored filename)
    pub filename: String,
    /// Extracted page text
    pub text: String,
}

impl BatchItem {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        BatchItem {
            filename: filename.into(),
            text: text.into(),
        }
    }
}

/// Outcome for a single document of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub filename: String,
    pub success: bool,
    pub metadata: Option<MetadataRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl MetadataGateway {
    /// Extract metadata for several documents, one request at a time.
    ///
    /// A failure is recorded against its document and the batch moves on;
    /// entries come back in input order.
    pub async fn extract_batch(
        &self,
        items: &[BatchItem],
        model: impl AsRef<str>,
        credentials: &Credentials,
        options: Option<&GenerationOptions>,
    ) -> Vec<BatchEntry> {
        let model = model.as_ref();
        let mut entries = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            info!(
                "Analysing {} ({}/{}) with {}",
                item.filename,
                index + 1,
                items.len(),
                model
            );

            let entry = match self.extract(&item.text, model, credentials, options).await {
                Ok(record) => BatchEntry {
                    filename: item.filename.clone(),
                    success: true,
                    metadata: Some(record),
                    error: None,
                    error_kind: None,
                },
                Err(e) => {
                    warn!("Failed to analyse {}: {}", item.filename, e);
                    BatchEntry {
                        filename: item.filename.clone(),
                        success: false,
                        metadata: None,
                        error: Some(e.to_string()),
                        error_kind: Some(e.kind()),
                    }
                }
            };
            entries.push(entry);
        }

        let succeeded = entries.iter().filter(|e| e.success).count();
        info!(
            "Batch finished: {} succeeded, {} failed",
            succeeded,
            entries.len() - succeeded
        );

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Provider;

    #[tokio::test]
    async fn test_precondition_failures_are_reported_per_item() {
        let gateway = MetadataGateway::new();
        let credentials = Credentials::new().with(Provider::OpenAI, "sk-test");
        let items = vec![BatchItem::new("empty.pdf", "  "), BatchItem::new("blank.pdf", "")];

        let entries = gateway
            .extract_batch(&items, "sonnet", &credentials, None)
            .await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "empty.pdf");
        assert_eq!(entries[1].filename, "blank.pdf");
        for entry in &entries {
            assert!(!entry.success);
            assert!(entry.metadata.is_none());
            assert_eq!(entry.error_kind, Some(ErrorKind::InvalidInput));
        }
    }

    #[tokio::test]
    async fn test_entry_serialization() {
        let gateway = MetadataGateway::new();
        let items = vec![BatchItem::new("paper.pdf", "some text")];

        let entries = gateway
            .extract_batch(&items, "sonnet", &Credentials::new(), None)
            .await;
        let json = serde_json::to_value(&entries[0]).unwrap();

        assert_eq!(json["filename"], "paper.pdf");
        assert_eq!(json["success"], false);
        assert!(json["metadata"].is_null());
        assert_eq!(json["error_kind"], "missing_credential");
    }
}
