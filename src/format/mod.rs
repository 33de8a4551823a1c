// Format-aware extraction and reconstruction
//
// Each supported file family is a variant of `FormatKind` with one adapter:
// - Subtitle: line-oriented cue files (.srt, .vtt)
// - Document: word-processor documents (.docx)
// - Pdf: converted to a document first, then handled as one

pub mod document;
pub mod pdf;
pub mod subtitle;
pub mod xml;

use std::path::Path;

use async_trait::async_trait;

pub use document::DocumentAdapter;
pub use pdf::PdfAdapter;
pub use subtitle::SubtitleAdapter;
use crate::error::{Result, TsuyakuError};
use crate::translate::TranslationOutcome;

/// Extensions accepted by the pipeline
pub const SUPPORTED_EXTENSIONS: &[&str] = &["srt", "vtt", "docx", "pdf"];

/// Closed set of supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Subtitle,
    Document,
    Pdf,
}

impl FormatKind {
    /// Classify a file by its extension, case-insensitive.
    /// Returns the kind and the lowercased extension including the dot.
    pub fn classify(filename: &str) -> Result<(Self, String)> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let kind = match extension.as_str() {
            "srt" | "vtt" => Self::Subtitle,
            "docx" => Self::Document,
            "pdf" => Self::Pdf,
            _ => {
                return Err(TsuyakuError::UnsupportedFormat(if extension.is_empty() {
                    format!("{} has no extension", filename)
                } else {
                    format!(".{}", extension)
                }));
            }
        };

        Ok((kind, format!(".{}", extension)))
    }

    /// Extension of the produced file. PDF input always becomes a document.
    pub fn output_extension<'a>(&self, input_extension: &'a str) -> &'a str {
        match self {
            Self::Pdf => ".docx",
            Self::Subtitle | Self::Document => input_extension,
        }
    }

    pub fn is_supported_path(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// One translatable unit. `slot` addresses its place in the owning shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub slot: usize,
    pub text: String,
}

impl Segment {
    pub fn new(slot: usize, text: impl Into<String>) -> Self {
        Self {
            slot,
            text: text.into(),
        }
    }
}

/// Output of `FormatAdapter::extract`
#[derive(Debug)]
pub struct Extraction<S> {
    pub shell: S,
    pub segments: Vec<Segment>,
}

/// Extracts translatable segments from a buffer and writes translations back
#[async_trait]
pub trait FormatAdapter: Send + Sync {
    /// Non-text skeleton kept between extraction and reconstruction
    type Shell: Send;

    async fn extract(&self, input: &[u8]) -> Result<Extraction<Self::Shell>>;

    /// Rebuild the output buffer. `outcomes[i]` belongs to `segments[i]`.
    async fn reconstruct(
        &self,
        shell: Self::Shell,
        segments: &[Segment],
        outcomes: Vec<TranslationOutcome>,
    ) -> Result<Vec<u8>>;
}

/// Guard shared by adapters: translated texts must line up with extracted segments
pub(crate) fn check_alignment(segments: &[Segment], outcomes: &[TranslationOutcome]) -> Result<()> {
    if segments.len() != outcomes.len() {
        return Err(TsuyakuError::Document(format!(
            "{} translations for {} extracted segments",
            outcomes.len(),
            segments.len()
        )));
    }
    Ok(())
}
