use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, TsuyakuError};

fn default_max_text_length() -> usize {
    5000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub translate: TranslateConfig,
    pub convert: ConvertConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation backend
    pub provider: TranslationProvider,
    /// Source language code, `auto` for detection
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Google translate endpoint URL
    pub endpoint: String,
    /// Ollama endpoint URL
    pub ollama_endpoint: String,
    /// LLM model to use with the Ollama provider
    pub model: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Longest segment the backend accepts, in characters
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationProvider {
    /// Public Google translate endpoint
    Google,
    /// Local LLM served by ollama
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Path to the PDF to DOCX converter binary
    pub binary_path: String,
    /// Converter arguments; `{input}` and `{output}` are replaced with the staged paths
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Files translated at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_files: usize,
    /// Segments of one file translated at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_segments: usize,
    /// Archive file name; `{target}` is replaced with the target language code
    pub archive_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate: TranslateConfig {
                provider: TranslationProvider::Google,
                source_language: "auto".to_string(),
                target_language: "iw".to_string(),
                endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
                ollama_endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                timeout_secs: default_timeout_secs(),
                max_text_length: default_max_text_length(),
            },
            convert: ConvertConfig {
                binary_path: "pdf2docx".to_string(),
                args: vec![
                    "convert".to_string(),
                    "{input}".to_string(),
                    "{output}".to_string(),
                ],
            },
            batch: BatchConfig {
                max_concurrent_files: 1,
                max_concurrent_segments: 1,
                archive_name: "Translated_Files_{target}.zip".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TsuyakuError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| TsuyakuError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TsuyakuError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TsuyakuError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
