//! # Normalization Facade
//!
//! The single entry point callers use: dispatch on [`SourceKind`], run the
//! matching extractor, and hand back its result untouched. Hard failures are
//! wrapped in [`ExtractionFailure`] carrying the source kind.

use crate::config::ExtractOptions;
use crate::curl::extract_curl;
use crate::error::{AppError, AppResult, ExtractionFailure};
use crate::models::{ExtractionResult, SourceKind, Warning, WarningKind};
use crate::oas::extract_openapi;
use crate::scanner::scan_directory;
use std::path::PathBuf;

/// Input for one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Document text or a cURL command.
    Text(String),
    /// A materialized archive or repository checkout.
    Directory(PathBuf),
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<PathBuf> for Payload {
    fn from(path: PathBuf) -> Self {
        Payload::Directory(path)
    }
}

/// Extracts endpoints from `payload`, interpreted as `kind`.
///
/// `openapi` and `curl` take [`Payload::Text`]; `archive` and `repository`
/// take [`Payload::Directory`]. Every warning the extractor produced is kept
/// in order.
pub fn extract(
    kind: SourceKind,
    payload: &Payload,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionFailure> {
    tracing::debug!(%kind, "extraction started");
    dispatch(kind, payload, options).map_err(|error| {
        tracing::debug!(%kind, %error, "extraction failed");
        ExtractionFailure { kind, error }
    })
}

fn dispatch(kind: SourceKind, payload: &Payload, options: &ExtractOptions) -> AppResult<ExtractionResult> {
    match (kind, payload) {
        (SourceKind::OpenApi, Payload::Text(text)) => {
            extract_openapi(text, options.format, &options.config, &options.cancel)
        }
        (SourceKind::Curl, Payload::Text(command)) => {
            // Single record: cancellation only matters before it starts.
            if options.cancel.is_cancelled() {
                let mut result = ExtractionResult::new();
                result.warn(Warning::new(
                    WarningKind::Truncated,
                    "cancelled before the command was parsed",
                ));
                return Ok(result);
            }
            extract_curl(command)
        }
        (SourceKind::Archive | SourceKind::Repository, Payload::Directory(root)) => {
            scan_directory(root, &options.config, &options.cancel)
        }
        (SourceKind::OpenApi | SourceKind::Curl, Payload::Directory(_)) => {
            Err(AppError::PayloadMismatch {
                kind,
                expected: "text",
            })
        }
        (SourceKind::Archive | SourceKind::Repository, Payload::Text(_)) => {
            Err(AppError::PayloadMismatch {
                kind,
                expected: "a materialized directory",
            })
        }
    }
}
