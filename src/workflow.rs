use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::archive::ArchiveBuilder;
use crate::batch::{BatchOrchestrator, BatchReport, ProgressObserver};
use crate::config::Config;
use crate::convert::{ConverterFactory, PdfConverter};
use crate::error::{Result, TsuyakuError};
use crate::format::FormatKind;
use crate::job::{FileJobRunner, InputFile};
use crate::language::LanguagePair;
use crate::translate::{TranslationPort, TranslatorFactory};

/// What a workflow run produced on disk
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub report: BatchReport,
    /// Archive or individual output files, in the order they were written
    pub written: Vec<PathBuf>,
}

pub struct Workflow {
    config: Config,
    port: Arc<dyn TranslationPort>,
    converter: Box<dyn PdfConverter>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let port = TranslatorFactory::create_port(&config.translate)?;
        let converter = ConverterFactory::create_converter(config.convert.clone());

        Ok(Self::with_components(config, port, converter))
    }

    /// Build a workflow around explicit collaborators
    pub fn with_components(
        config: Config,
        port: Arc<dyn TranslationPort>,
        converter: Box<dyn PdfConverter>,
    ) -> Self {
        Self {
            config,
            port,
            converter,
        }
    }

    /// Load every input into memory.
    ///
    /// Directories are walked recursively and only supported files are picked up.
    /// Files named explicitly are always loaded so unsupported ones get reported.
    pub async fn collect_inputs<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<InputFile>> {
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                return Err(TsuyakuError::FileNotFound(path.display().to_string()));
            }

            if path.is_dir() {
                info!("Scanning directory: {}", path.display());
                for entry in WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                {
                    if entry.file_type().is_file() && FormatKind::is_supported_path(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
            } else {
                files.push(path.to_path_buf());
            }
        }

        let mut inputs = Vec::with_capacity(files.len());
        for file in files {
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| TsuyakuError::FileNotFound(file.display().to_string()))?;
            let bytes = fs::read(&file).await?;
            inputs.push(InputFile::new(filename, bytes));
        }

        info!("Found {} files to translate", inputs.len());
        Ok(inputs)
    }

    /// Translate the inputs and write the results into `output_dir`
    pub async fn run(
        &self,
        inputs: &[InputFile],
        output_dir: &Path,
        write_archive: bool,
        observer: &dyn ProgressObserver,
    ) -> Result<WorkflowOutcome> {
        let pair = LanguagePair::new(
            &self.config.translate.source_language,
            &self.config.translate.target_language,
        )?;
        info!("Translating {} files ({}) with {}", inputs.len(), pair, self.port.name());

        if inputs.iter().any(|input| matches!(FormatKind::classify(&input.filename), Ok((FormatKind::Pdf, _)))) {
            if let Err(e) = self.converter.check_availability().await {
                warn!("PDF files will likely fail: {}", e);
            }
        }

        let runner = FileJobRunner::new(self.port.as_ref(), &pair, self.converter.as_ref())
            .with_segment_concurrency(self.config.batch.max_concurrent_segments);
        let report = BatchOrchestrator::new(runner)
            .with_concurrency(self.config.batch.max_concurrent_files)
            .run_batch(inputs, observer)
            .await;

        let written = self.write_outputs(&report, &pair, output_dir, write_archive).await?;
        Ok(WorkflowOutcome { report, written })
    }

    async fn write_outputs(
        &self,
        report: &BatchReport,
        pair: &LanguagePair,
        output_dir: &Path,
        write_archive: bool,
    ) -> Result<Vec<PathBuf>> {
        let successes = report.successes();
        if successes.is_empty() {
            warn!("No files were translated, nothing to write");
            return Ok(Vec::new());
        }

        fs::create_dir_all(output_dir).await?;

        if write_archive {
            let name = ArchiveBuilder::archive_name(&self.config.batch.archive_name, pair.target());
            let path = output_dir.join(name);
            fs::write(&path, ArchiveBuilder::build(&successes)?).await?;
            info!("Archive written: {}", path.display());
            return Ok(vec![path]);
        }

        let mut written = Vec::with_capacity(successes.len());
        for file in successes {
            let path = output_dir.join(&file.filename);
            fs::write(&path, &file.bytes).await?;
            info!("Output written: {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
