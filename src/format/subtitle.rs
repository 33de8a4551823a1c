use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, TsuyakuError};
use crate::translate::TranslationOutcome;
use super::{check_alignment, Extraction, FormatAdapter, Segment};

const BOM: &str = "\u{feff}";
const TIMING_ARROW: &str = "-->";
const VTT_HEADER: &str = "WEBVTT";

/// How a subtitle line is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Timing,
    Index,
    Header,
    Blank,
    Text,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.contains(TIMING_ARROW) {
            Self::Timing
        } else if !trimmed.is_empty() && trimmed.chars().all(char::is_numeric) {
            Self::Index
        } else if trimmed.starts_with(VTT_HEADER) {
            Self::Header
        } else if trimmed.is_empty() {
            Self::Blank
        } else {
            Self::Text
        }
    }
}

#[derive(Debug)]
pub struct SubtitleShell {
    bom: bool,
    lines: Vec<String>,
}

/// SRT / WebVTT cue files
pub struct SubtitleAdapter;

impl SubtitleAdapter {
    fn split(input: &[u8]) -> Result<SubtitleShell> {
        let content = std::str::from_utf8(input)
            .map_err(|e| TsuyakuError::Decode(format!("Subtitle is not valid UTF-8: {}", e)))?;

        let (bom, content) = match content.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, content),
        };

        Ok(SubtitleShell {
            bom,
            lines: content.lines().map(str::to_string).collect(),
        })
    }
}

#[async_trait]
impl FormatAdapter for SubtitleAdapter {
    type Shell = SubtitleShell;

    async fn extract(&self, input: &[u8]) -> Result<Extraction<SubtitleShell>> {
        let shell = Self::split(input)?;

        let segments: Vec<Segment> = shell.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| LineKind::classify(line) == LineKind::Text)
            .map(|(idx, line)| Segment::new(idx, line.clone()))
            .collect();

        debug!("Subtitle: {} of {} lines translatable", segments.len(), shell.lines.len());

        Ok(Extraction { shell, segments })
    }

    async fn reconstruct(
        &self,
        shell: SubtitleShell,
        segments: &[Segment],
        outcomes: Vec<TranslationOutcome>,
    ) -> Result<Vec<u8>> {
        check_alignment(segments, &outcomes)?;

        let SubtitleShell { bom, mut lines } = shell;
        for (segment, outcome) in segments.iter().zip(outcomes) {
            let line = lines.get_mut(segment.slot).ok_or_else(|| {
                TsuyakuError::Document(format!("Subtitle line {} out of range", segment.slot))
            })?;
            *line = outcome.into_text();
        }

        let mut output = String::new();
        if bom {
            output.push_str(BOM);
        }
        for line in &lines {
            output.push_str(line);
            output.push('\n');
        }

        Ok(output.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn round_trip(input: &str, translate: impl Fn(&str) -> String) -> String {
        let adapter = SubtitleAdapter;
        let extraction = adapter.extract(input.as_bytes()).await.unwrap();
        let outcomes = extraction.segments
            .iter()
            .map(|s| TranslationOutcome::Translated(translate(&s.text)))
            .collect();
        let output = adapter
            .reconstruct(extraction.shell, &extraction.segments, outcomes)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_line_classification() {
        assert_eq!(LineKind::classify("00:00:01,000 --> 00:00:02,000"), LineKind::Timing);
        assert_eq!(LineKind::classify("00:01.000 --> 00:02.000 align:start"), LineKind::Timing);
        assert_eq!(LineKind::classify("42"), LineKind::Index);
        assert_eq!(LineKind::classify(" 7 "), LineKind::Index);
        assert_eq!(LineKind::classify("\u{0661}\u{0662}"), LineKind::Index);
        assert_eq!(LineKind::classify("\u{0967}\u{0966}"), LineKind::Index);
        assert_eq!(LineKind::classify("WEBVTT"), LineKind::Header);
        assert_eq!(LineKind::classify("WEBVTT - Episode 1"), LineKind::Header);
        assert_eq!(LineKind::classify(""), LineKind::Blank);
        assert_eq!(LineKind::classify(" \t"), LineKind::Blank);
        assert_eq!(LineKind::classify("Hello world"), LineKind::Text);
        assert_eq!(LineKind::classify("3 apples"), LineKind::Text);
    }

    #[tokio::test]
    async fn test_extract_only_text_lines() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nHello world\nSecond line\n\n2\n00:00:03,000 --> 00:00:04,000\nBye\n";
        let extraction = SubtitleAdapter.extract(srt.as_bytes()).await.unwrap();

        let texts: Vec<&str> = extraction.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello world", "Second line", "Bye"]);
        let slots: Vec<usize> = extraction.segments.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![2, 3, 7]);
    }

    #[tokio::test]
    async fn test_pass_through_is_byte_identical() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nHello world\n\n";
        assert_eq!(round_trip(srt, |t| t.to_string()).await, srt);
    }

    #[tokio::test]
    async fn test_structural_lines_survive_translation() {
        let vtt = "WEBVTT\n\n00:01.000 --> 00:02.000\nGood night\n";
        let output = round_trip(vtt, |t| t.to_uppercase()).await;
        assert_eq!(output, "WEBVTT\n\n00:01.000 --> 00:02.000\nGOOD NIGHT\n");
    }

    #[tokio::test]
    async fn test_final_line_gets_newline_and_crlf_is_normalized() {
        let srt = "1\r\n00:00:01,000 --> 00:00:02,000\r\nHi";
        let output = round_trip(srt, |t| format!("<{}>", t)).await;
        assert_eq!(output, "1\n00:00:01,000 --> 00:00:02,000\n<Hi>\n");
    }

    #[tokio::test]
    async fn test_bom_is_kept_and_not_translated() {
        let srt = "\u{feff}1\n00:00:01,000 --> 00:00:02,000\nHi\n";
        let extraction = SubtitleAdapter.extract(srt.as_bytes()).await.unwrap();
        assert_eq!(extraction.segments.len(), 1);
        assert_eq!(round_trip(srt, |t| t.to_string()).await, srt);
    }

    #[tokio::test]
    async fn test_fallback_keeps_original_line() {
        let adapter = SubtitleAdapter;
        let srt = "1\n00:00:01,000 --> 00:00:02,000\n  Hello\n";
        let extraction = adapter.extract(srt.as_bytes()).await.unwrap();
        let outcomes = vec![TranslationOutcome::Fallback {
            original: extraction.segments[0].text.clone(),
            reason: "offline".to_string(),
        }];
        let output = adapter
            .reconstruct(extraction.shell, &extraction.segments, outcomes)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), srt);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decode_error() {
        let err = SubtitleAdapter.extract(&[0x31, 0x0a, 0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, TsuyakuError::Decode(_)));
    }

    #[tokio::test]
    async fn test_misaligned_outcomes_are_rejected() {
        let adapter = SubtitleAdapter;
        let extraction = adapter.extract(b"Hello\nWorld\n").await.unwrap();
        let err = adapter
            .reconstruct(extraction.shell, &extraction.segments, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, TsuyakuError::Document(_)));
    }
}
