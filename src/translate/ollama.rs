use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, TsuyakuError};
use crate::language::{language_name, LanguagePair};
use super::TranslationPort;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translation through a local ollama model
pub struct OllamaPort {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaPort {
    pub fn new(client: Client, config: &TranslateConfig) -> Self {
        Self {
            client,
            endpoint: config.ollama_endpoint.clone(),
            model: config.model.clone(),
        }
    }

    fn build_translation_prompt(&self, text: &str, pair: &LanguagePair) -> String {
        let target_name = language_name(pair.target());
        let source_hint = if pair.is_auto_detect() {
            String::new()
        } else {
            format!("The source language is {}.\n", language_name(pair.source()))
        };

        format!(
            "You are a professional translator.\n\
             \n\
             CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
             The target language is: {} (language code: {})\n\
             {}\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             [Text to translate]\n\
             {}\n",
            target_name, target_name, pair.target(), source_hint, target_name, text
        )
    }
}

#[async_trait]
impl TranslationPort for OllamaPort {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: self.build_translation_prompt(text, pair),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);

        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TsuyakuError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TsuyakuError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| TsuyakuError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = generated.response.trim().to_string();

        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(TsuyakuError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(&raw_response) {
            return Ok(result.text.trim().to_string());
        }

        Ok(clean_translation_response(&raw_response))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Pick the translation out of a chatty model answer
fn clean_translation_response(response: &str) -> String {
    let is_chatter = |line: &str| {
        line.starts_with("Here are")
            || line.starts_with("Option")
            || line.starts_with("**Option")
            || line.starts_with("Translation:")
            || line.starts_with("- ")
            || line.starts_with("* ")
            || (line.starts_with("**") && line.ends_with("**"))
    };

    let lines: Vec<&str> = response.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .iter()
        .find(|line| !is_chatter(line) && line.chars().count() > 3)
        .or_else(|| lines.first())
        .map(|line| line.to_string())
        .unwrap_or_else(|| response.to_string())
}
