use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::convert::PdfConverter;
use crate::error::{Result, TsuyakuError};
use crate::translate::TranslationOutcome;
use super::document::{DocumentAdapter, DocumentShell};
use super::{Extraction, FormatAdapter, Segment};

/// PDF input: converted to a document, then handled by `DocumentAdapter`
pub struct PdfAdapter<'a> {
    converter: &'a dyn PdfConverter,
}

impl<'a> PdfAdapter<'a> {
    pub fn new(converter: &'a dyn PdfConverter) -> Self {
        Self { converter }
    }

    /// Convert a PDF buffer to a .docx buffer.
    ///
    /// Both files live in a staging directory unique to this call, removed when
    /// it goes out of scope on every return path.
    pub async fn convert_to_document(&self, pdf: &[u8]) -> Result<Vec<u8>> {
        let staging = tempfile::Builder::new()
            .prefix("tsuyaku-pdf-")
            .tempdir()
            .map_err(|e| TsuyakuError::Conversion(format!("Failed to create staging directory: {}", e)))?;

        let tag = Uuid::new_v4().simple().to_string();
        let input_path = staging.path().join(format!("input_{}.pdf", &tag[..8]));
        let output_path = staging.path().join(format!("output_{}.docx", &tag[..8]));

        debug!("Staging PDF in {}", staging.path().display());
        tokio::fs::write(&input_path, pdf).await?;

        self.converter
            .convert(&input_path, &output_path)
            .await
            .map_err(|e| {
                let cause = match e {
                    TsuyakuError::Conversion(message) => message,
                    other => other.to_string(),
                };
                TsuyakuError::Conversion(format!("PDF to DOCX conversion failed: {}", cause))
            })?;

        let document = tokio::fs::read(&output_path).await.map_err(|e| {
            TsuyakuError::Conversion(format!("PDF to DOCX conversion produced no document: {}", e))
        })?;

        info!("Converted PDF ({} bytes) to DOCX ({} bytes)", pdf.len(), document.len());
        Ok(document)
    }
}

#[async_trait]
impl FormatAdapter for PdfAdapter<'_> {
    type Shell = DocumentShell;

    async fn extract(&self, input: &[u8]) -> Result<Extraction<DocumentShell>> {
        let document = self.convert_to_document(input).await?;
        DocumentAdapter.extract(&document).await
    }

    async fn reconstruct(
        &self,
        shell: DocumentShell,
        segments: &[Segment],
        outcomes: Vec<TranslationOutcome>,
    ) -> Result<Vec<u8>> {
        DocumentAdapter.reconstruct(shell, segments, outcomes).await
    }
}
