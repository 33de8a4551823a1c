use std::collections::BTreeMap;
use std::pin::pin;

use futures::stream::{self, StreamExt};
use tracing::info;

use crate::job::{FileJobRunner, FileResult, InputFile, TranslatedFile};

/// Category every file-level failure is reported under
pub const ERROR_CATEGORY: &str = "Error";

/// Receives progress while a batch runs
pub trait ProgressObserver: Send + Sync {
    /// Called once per file, in input order, after the file finished
    fn on_file_complete(&self, completed: usize, total: usize, filename: &str, result: &FileResult);

    fn on_batch_complete(&self, _report: &BatchReport) {}
}

/// Observer that ignores all progress
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_file_complete(&self, _completed: usize, _total: usize, _filename: &str, _result: &FileResult) {}
}

/// Ordered results of one batch run, one per input file
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    results: Vec<FileResult>,
}

impl BatchReport {
    pub fn new(results: Vec<FileResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[FileResult] {
        &self.results
    }

    pub fn successes(&self) -> Vec<&TranslatedFile> {
        self.results
            .iter()
            .filter_map(|result| match result {
                FileResult::Success(file) => Some(file),
                FileResult::Failure { .. } => None,
            })
            .collect()
    }

    /// (input filename, reason) for each failed file
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .filter_map(|result| match result {
                FileResult::Failure { filename, reason } => Some((filename.as_str(), reason.as_str())),
                FileResult::Success(_) => None,
            })
            .collect()
    }

    /// Failures grouped by category as `"<filename>: <reason>"` lines
    pub fn error_summary(&self) -> BTreeMap<&'static str, Vec<String>> {
        let mut summary: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for (filename, reason) in self.failures() {
            summary
                .entry(ERROR_CATEGORY)
                .or_default()
                .push(format!("{}: {}", filename, reason));
        }
        summary
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs the file job over every input and collects the results
pub struct BatchOrchestrator<'a> {
    runner: FileJobRunner<'a>,
    max_concurrent_files: usize,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(runner: FileJobRunner<'a>) -> Self {
        Self {
            runner,
            max_concurrent_files: 1,
        }
    }

    /// Allow up to `max_concurrent` files in flight. Results keep input order.
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent_files = max_concurrent.max(1);
        self
    }

    pub async fn run_batch(&self, files: &[InputFile], observer: &dyn ProgressObserver) -> BatchReport {
        let total = files.len();
        info!("Starting batch of {} files ({} at a time)", total, self.max_concurrent_files);

        let mut results = Vec::with_capacity(total);
        let mut completed = pin!(
            stream::iter(files)
                .map(|file| self.runner.run(file))
                .buffered(self.max_concurrent_files)
        );

        while let Some(result) = completed.next().await {
            let done = results.len() + 1;
            info!("Processed {}/{}: {}", done, total, result.source_filename());
            observer.on_file_complete(done, total, result.source_filename(), &result);
            results.push(result);
        }

        let report = BatchReport::new(results);
        info!(
            "Batch finished: {} succeeded, {} failed",
            report.successes().len(),
            report.failures().len()
        );
        observer.on_batch_complete(&report);
        report
    }
}
