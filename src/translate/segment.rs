use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::format::Segment;
use crate::language::LanguagePair;
use super::TranslationPort;

/// Result of translating one segment. A failed call never stops the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    Fallback { original: String, reason: String },
}

impl TranslationOutcome {
    /// Text to write back into the document
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Applies a translation port to segments, absorbing per-segment failures
pub struct SegmentTranslator<'a> {
    port: &'a dyn TranslationPort,
    pair: &'a LanguagePair,
    max_concurrent: usize,
}

impl<'a> SegmentTranslator<'a> {
    pub fn new(port: &'a dyn TranslationPort, pair: &'a LanguagePair) -> Self {
        Self {
            port,
            pair,
            max_concurrent: 1,
        }
    }

    /// Allow up to `max_concurrent` port calls in flight for one file
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Translate one segment with exactly one port call.
    ///
    /// Only the trimmed core of `text` is sent; the surrounding whitespace of the
    /// original is put back around the translation.
    pub async fn translate(&self, text: &str) -> TranslationOutcome {
        let core = text.trim();
        if core.is_empty() {
            return TranslationOutcome::Fallback {
                original: text.to_string(),
                reason: "nothing to translate".to_string(),
            };
        }

        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];

        match self.port.translate(core, self.pair).await {
            Ok(translation) => {
                TranslationOutcome::Translated(format!("{}{}{}", leading, translation, trailing))
            }
            Err(e) => TranslationOutcome::Fallback {
                original: text.to_string(),
                reason: e.to_string(),
            },
        }
    }

    /// Translate all segments, returning outcomes in extraction order
    pub async fn translate_all(&self, segments: &[Segment]) -> Vec<TranslationOutcome> {
        let total = segments.len();

        stream::iter(segments.iter().enumerate())
            .map(|(idx, segment)| async move {
                let outcome = self.translate(&segment.text).await;
                match &outcome {
                    TranslationOutcome::Translated(text) => {
                        debug!("Segment {}/{}: {:?} -> {:?}", idx + 1, total, segment.text, text);
                    }
                    TranslationOutcome::Fallback { reason, .. } => {
                        warn!("Segment {}/{} kept original text: {}", idx + 1, total, reason);
                    }
                }
                outcome
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use crate::error::{Result, TsuyakuError};
    use crate::translate::MockTranslationPort;

    /// Answers "slow" last and records the order in which calls finish
    struct DelayedPort {
        finished: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TranslationPort for DelayedPort {
        async fn translate(&self, text: &str, _pair: &LanguagePair) -> Result<String> {
            if text == "slow" {
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            self.finished.lock().unwrap().push(text.to_string());
            Ok(format!("{}!", text))
        }

        fn name(&self) -> &'static str {
            "delayed"
        }
    }

    fn pair() -> LanguagePair {
        LanguagePair::new("auto", "fr").unwrap()
    }

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(slot, text)| Segment::new(slot, *text))
            .collect()
    }

    #[tokio::test]
    async fn test_translate_success_calls_port_once() {
        let mut port = MockTranslationPort::new();
        port.expect_translate()
            .times(1)
            .returning(|text: &str, _: &LanguagePair| Ok(format!("fr:{}", text)));

        let pair = pair();
        let translator = SegmentTranslator::new(&port, &pair);
        let outcome = translator.translate("Hello").await;

        assert_eq!(outcome, TranslationOutcome::Translated("fr:Hello".to_string()));
    }

    #[tokio::test]
    async fn test_translate_failure_falls_back_to_original() {
        let mut port = MockTranslationPort::new();
        port.expect_translate()
            .times(1)
            .returning(|_: &str, _: &LanguagePair| {
                Err(TsuyakuError::Translation("quota exceeded".to_string()))
            });

        let pair = pair();
        let translator = SegmentTranslator::new(&port, &pair);
        let outcome = translator.translate("Hello").await;

        assert!(outcome.is_fallback());
        assert_eq!(outcome.text(), "Hello");
        match outcome {
            TranslationOutcome::Fallback { reason, .. } => assert!(reason.contains("quota exceeded")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_kept() {
        let mut port = MockTranslationPort::new();
        port.expect_translate()
            .times(1)
            .returning(|text: &str, _: &LanguagePair| {
                assert_eq!(text, "Hello");
                Ok("Bonjour".to_string())
            });

        let pair = pair();
        let translator = SegmentTranslator::new(&port, &pair);
        assert_eq!(translator.translate("  Hello \t").await.text(), "  Bonjour \t");
    }

    #[tokio::test]
    async fn test_blank_text_never_reaches_port() {
        let mut port = MockTranslationPort::new();
        port.expect_translate().times(0);

        let pair = pair();
        let translator = SegmentTranslator::new(&port, &pair);
        assert_eq!(translator.translate("   ").await.text(), "   ");
    }

    #[tokio::test]
    async fn test_translate_all_isolates_failures_and_keeps_order() {
        let mut port = MockTranslationPort::new();
        port.expect_translate()
            .times(3)
            .returning(|text: &str, _: &LanguagePair| {
                if text == "two" {
                    Err(TsuyakuError::Translation("boom".to_string()))
                } else {
                    Ok(text.to_uppercase())
                }
            });

        let pair = pair();
        let translator = SegmentTranslator::new(&port, &pair).with_concurrency(3);
        let outcomes = translator.translate_all(&segments(&["one", "two", "three"])).await;

        let texts: Vec<&str> = outcomes.iter().map(|o| o.text()).collect();
        assert_eq!(texts, vec!["ONE", "two", "THREE"]);
        assert!(outcomes[1].is_fallback());
    }

    #[tokio::test]
    async fn test_translate_all_keeps_order_when_first_segment_finishes_last() {
        let port = DelayedPort { finished: Mutex::new(Vec::new()) };
        let pair = pair();
        let translator = SegmentTranslator::new(&port, &pair).with_concurrency(3);

        let outcomes = translator.translate_all(&segments(&["slow", "quick", "quicker"])).await;

        let texts: Vec<&str> = outcomes.iter().map(|o| o.text()).collect();
        assert_eq!(texts, vec!["slow!", "quick!", "quicker!"]);
        assert_eq!(port.finished.lock().unwrap().last().map(String::as_str), Some("slow"));
    }
}
