use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, TsuyakuError};
use crate::language::LanguagePair;
use super::TranslationPort;

/// Translation through the public Google translate endpoint
pub struct GoogleTranslatePort {
    client: Client,
    endpoint: String,
    max_text_length: usize,
}

impl GoogleTranslatePort {
    pub fn new(client: Client, config: &TranslateConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            max_text_length: config.max_text_length,
        }
    }
}

#[async_trait]
impl TranslationPort for GoogleTranslatePort {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String> {
        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(TsuyakuError::Translation(format!(
                "Text of {} characters exceeds the {} character limit",
                length, self.max_text_length
            )));
        }

        debug!("Sending translation request to: {}", self.endpoint);

        let response = self.client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", pair.source()),
                ("tl", pair.target()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TsuyakuError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TsuyakuError::Translation(format!(
                "Translate API error {}: {}", status, error_text
            )));
        }

        let body: Value = response.json().await
            .map_err(|e| TsuyakuError::Translation(format!("Failed to parse response: {}", e)))?;

        parse_translation(&body)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// Join the translated chunks of a `dt=t` response: `[[["chunk", "source", ...], ...], ...]`
fn parse_translation(body: &Value) -> Result<String> {
    let chunks = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TsuyakuError::Translation("Unexpected response shape".to_string()))?;

    let translation: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(Value::as_str))
        .collect();

    if translation.trim().is_empty() {
        return Err(TsuyakuError::Translation("Empty translation received".to_string()));
    }

    Ok(translation)
}
