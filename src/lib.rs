//! Tsuyaku - batch document translation
//!
//! Translates subtitle (.srt, .vtt), word-processor (.docx) and PDF files
//! segment by segment while keeping their structure, and packages the
//! translated files into one archive.

pub mod archive;
pub mod batch;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod job;
pub mod language;
pub mod progress;
pub mod translate;
pub mod workflow;
