use std::fmt;

use crate::error::{Result, TsuyakuError};

/// Source code requesting automatic language detection
pub const AUTO_DETECT: &str = "auto";

/// Languages offered for translation, as (English name, backend code)
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("Hebrew", "iw"),
    ("English", "en"),
    ("Russian", "ru"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("Arabic", "ar"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Chinese", "zh-CN"),
    ("Japanese", "ja"),
    ("Dutch", "nl"),
];

/// A validated (source, target) language combination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    source: String,
    target: String,
}

impl LanguagePair {
    /// Build a pair from user input. Accepts codes or English names, case-insensitive.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source = if source.trim().eq_ignore_ascii_case(AUTO_DETECT) {
            AUTO_DETECT.to_string()
        } else {
            resolve_code(source)
                .ok_or_else(|| TsuyakuError::Config(format!("Unknown source language '{}'", source)))?
                .to_string()
        };

        if target.trim().eq_ignore_ascii_case(AUTO_DETECT) {
            return Err(TsuyakuError::Config(
                "Target language cannot be 'auto'".to_string(),
            ));
        }
        let target = resolve_code(target)
            .ok_or_else(|| TsuyakuError::Config(format!("Unknown target language '{}'", target)))?
            .to_string();

        Ok(Self { source, target })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_auto_detect(&self) -> bool {
        self.source == AUTO_DETECT
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Map a code or English name onto its canonical backend code
pub fn resolve_code(input: &str) -> Option<&'static str> {
    let input = input.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(name, code)| code.eq_ignore_ascii_case(input) || name.eq_ignore_ascii_case(input))
        .map(|(_, code)| *code)
}

/// English name for a language code, falling back to the code itself
pub fn language_name(code: &str) -> String {
    if code.eq_ignore_ascii_case(AUTO_DETECT) {
        return "the detected source language".to_string();
    }
    // "he" is the modern code for the "iw" the backend expects
    if code.eq_ignore_ascii_case("he") {
        return "Hebrew".to_string();
    }
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}
