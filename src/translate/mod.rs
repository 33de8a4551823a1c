// Translation backends
//
// This module provides the translation capability through a factory pattern:
// - Google: public translate endpoint, one request per segment
// - Ollama: local LLM with a JSON translation prompt
// - Segment: failure-isolating wrapper used by the format pipeline

pub mod google;
pub mod ollama;
pub mod segment;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

pub use segment::{SegmentTranslator, TranslationOutcome};
use crate::config::{TranslateConfig, TranslationProvider};
use crate::error::{Result, TsuyakuError};
use crate::language::LanguagePair;

/// Single-call text translation capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationPort: Send + Sync {
    /// Translate one unit of text for the given language pair
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String>;

    /// Backend name used in log output
    fn name(&self) -> &'static str;
}

/// Factory for creating translation ports
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the port selected by the configuration
    pub fn create_port(config: &TranslateConfig) -> Result<Arc<dyn TranslationPort>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TsuyakuError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let port: Arc<dyn TranslationPort> = match config.provider {
            TranslationProvider::Google => {
                Arc::new(google::GoogleTranslatePort::new(client, config))
            }
            TranslationProvider::Ollama => Arc::new(ollama::OllamaPort::new(client, config)),
        };
        Ok(port)
    }
}
