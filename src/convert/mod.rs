// PDF to document conversion
//
// The converter is an external program working on file paths:
// - Command: argument builder and process execution
// - CommandConverter: runs the configured binary for one conversion

pub mod command;

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

pub use command::ConverterCommand;
use crate::config::ConvertConfig;
use crate::error::{Result, TsuyakuError};

/// Converts a PDF file into a .docx file
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, input_path: &Path, output_path: &Path) -> Result<()>;

    /// Check if the converter can be run at all
    async fn check_availability(&self) -> Result<()>;
}

/// Runs the configured converter binary
pub struct CommandConverter {
    config: ConvertConfig,
}

impl CommandConverter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Build the conversion command, filling in the `{input}` and `{output}` placeholders
    pub fn build_command(&self, input_path: &Path, output_path: &Path) -> ConverterCommand {
        let input = input_path.to_string_lossy();
        let output = output_path.to_string_lossy();

        ConverterCommand::new(&self.config.binary_path, "Convert PDF to DOCX").args(
            self.config.args
                .iter()
                .map(|arg| arg.replace("{input}", &input).replace("{output}", &output)),
        )
    }
}

#[async_trait]
impl PdfConverter for CommandConverter {
    async fn convert(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        info!("Converting {} -> {}", input_path.display(), output_path.display());
        self.build_command(input_path, output_path).execute().await
    }

    async fn check_availability(&self) -> Result<()> {
        ConverterCommand::new(&self.config.binary_path, "Converter availability check")
            .arg("--help")
            .execute()
            .await
            .map_err(|e| TsuyakuError::Conversion(format!(
                "PDF converter '{}' is not available: {}",
                self.config.binary_path, e
            )))
    }
}

/// Factory for creating converter instances
pub struct ConverterFactory;

impl ConverterFactory {
    pub fn create_converter(config: ConvertConfig) -> Box<dyn PdfConverter> {
        Box::new(CommandConverter::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_build_command_fills_placeholders() {
        let converter = CommandConverter::new(Config::default().convert);
        let command = converter.build_command(Path::new("/tmp/in.pdf"), Path::new("/tmp/out.docx"));

        assert_eq!(command.binary_path, "pdf2docx");
        assert_eq!(command.args, vec!["convert", "/tmp/in.pdf", "/tmp/out.docx"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let converter = CommandConverter::new(ConvertConfig {
            binary_path: "/nonexistent/pdf2docx".to_string(),
            args: vec!["{input}".to_string(), "{output}".to_string()],
        });

        assert!(converter.check_availability().await.is_err());
        let err = converter
            .convert(Path::new("/tmp/in.pdf"), Path::new("/tmp/out.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, TsuyakuError::Conversion(_)));
    }
}
