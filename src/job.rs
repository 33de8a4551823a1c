use std::path::Path;

use tracing::{info, warn};

use crate::convert::PdfConverter;
use crate::error::{Result, TsuyakuError};
use crate::format::{DocumentAdapter, FormatAdapter, FormatKind, PdfAdapter, SubtitleAdapter};
use crate::language::LanguagePair;
use crate::translate::{SegmentTranslator, TranslationPort};

/// One uploaded file, fully buffered
#[derive(Debug, Clone)]
pub struct InputFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// A successfully translated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFile {
    pub source_filename: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-file outcome. Either the whole file translated or nothing is emitted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Success(TranslatedFile),
    Failure { filename: String, reason: String },
}

impl FileResult {
    /// Name of the input file this result belongs to
    pub fn source_filename(&self) -> &str {
        match self {
            Self::Success(file) => &file.source_filename,
            Self::Failure { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// `<base>.<target><ext>`, with PDF input producing a `.docx` name
pub fn output_filename(input: &str, kind: FormatKind, extension: &str, target: &str) -> Result<String> {
    let base = Path::new(input)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| TsuyakuError::UnsupportedFormat(format!("Invalid filename '{}'", input)))?;

    Ok(format!("{}.{}{}", base, target, kind.output_extension(extension)))
}

/// Runs extraction, translation and reconstruction for one file
pub struct FileJobRunner<'a> {
    port: &'a dyn TranslationPort,
    pair: &'a LanguagePair,
    converter: &'a dyn PdfConverter,
    max_concurrent_segments: usize,
}

impl<'a> FileJobRunner<'a> {
    pub fn new(
        port: &'a dyn TranslationPort,
        pair: &'a LanguagePair,
        converter: &'a dyn PdfConverter,
    ) -> Self {
        Self {
            port,
            pair,
            converter,
            max_concurrent_segments: 1,
        }
    }

    pub fn with_segment_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent_segments = max_concurrent.max(1);
        self
    }

    /// Translate one file. File-level errors become `FileResult::Failure`.
    pub async fn run(&self, input: &InputFile) -> FileResult {
        match self.try_run(input).await {
            Ok(file) => {
                info!("Translated {} -> {}", file.source_filename, file.filename);
                FileResult::Success(file)
            }
            Err(e) => {
                warn!("Failed to translate {}: {}", input.filename, e);
                FileResult::Failure {
                    filename: input.filename.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_run(&self, input: &InputFile) -> Result<TranslatedFile> {
        let (kind, extension) = FormatKind::classify(&input.filename)?;
        let filename = output_filename(&input.filename, kind, &extension, self.pair.target())?;

        info!("Translating {} ({:?}, {})", input.filename, kind, self.pair);

        let translator = SegmentTranslator::new(self.port, self.pair)
            .with_concurrency(self.max_concurrent_segments);

        let bytes = match kind {
            FormatKind::Subtitle => translate_with(&SubtitleAdapter, &input.bytes, &translator).await?,
            FormatKind::Document => translate_with(&DocumentAdapter, &input.bytes, &translator).await?,
            FormatKind::Pdf => {
                translate_with(&PdfAdapter::new(self.converter), &input.bytes, &translator).await?
            }
        };

        Ok(TranslatedFile {
            source_filename: input.filename.clone(),
            filename,
            bytes,
        })
    }
}

/// Extract, translate each segment in order, and rebuild the buffer
pub async fn translate_with<A: FormatAdapter>(
    adapter: &A,
    input: &[u8],
    translator: &SegmentTranslator<'_>,
) -> Result<Vec<u8>> {
    let extraction = adapter.extract(input).await?;
    let outcomes = translator.translate_all(&extraction.segments).await;

    let fallbacks = outcomes.iter().filter(|outcome| outcome.is_fallback()).count();
    if fallbacks > 0 {
        warn!("{} of {} segments kept their original text", fallbacks, outcomes.len());
    }

    adapter.reconstruct(extraction.shell, &extraction.segments, outcomes).await
}
