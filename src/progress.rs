use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{BatchReport, ProgressObserver};
use crate::job::FileResult;

/// Terminal progress bar for a batch run
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    /// Progress bar that draws nothing, for tests and non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_file_complete(&self, completed: usize, total: usize, filename: &str, result: &FileResult) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        match result {
            FileResult::Success(_) => self.bar.set_message(format!("Translated {}", filename)),
            FileResult::Failure { .. } => self.bar.set_message(format!("Failed {}", filename)),
        }
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        self.bar.finish_with_message(format!(
            "{} translated, {} failed",
            report.successes().len(),
            report.failures().len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_follows_completed_files() {
        let progress = ConsoleProgress::hidden();
        let failure = FileResult::Failure {
            filename: "b.txt".to_string(),
            reason: "Unsupported format: .txt".to_string(),
        };

        progress.on_file_complete(1, 3, "b.txt", &failure);
        assert_eq!(progress.position(), 1);
        progress.on_file_complete(3, 3, "b.txt", &failure);
        assert_eq!(progress.position(), 3);
    }
}
