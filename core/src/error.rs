//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace, plus the
//! `ExtractionFailure` wrapper the facade hands back to callers.
//!
//! Only malformation of the input format itself is an error. Incomplete or
//! ambiguous content is reported through [`crate::models::Warning`] instead.

use crate::models::SourceKind;
use derive_more::{Display, From};
use std::fmt;
use std::path::PathBuf;

/// Line/column position reported by the underlying JSON or YAML parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// 1-based line, when known.
    pub line: Option<usize>,
    /// 1-based column, when known.
    pub column: Option<usize>,
}

impl SourcePosition {
    /// A position that carries no location information.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// A known line/column pair.
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, " at line {}, column {}", line, column),
            (Some(line), None) => write!(f, " at line {}", line),
            _ => Ok(()),
        }
    }
}

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The JSON or YAML text could not be parsed.
    #[from(ignore)]
    #[display("Document parse error{position}: {message}")]
    DocumentParse {
        /// Parser message.
        message: String,
        /// Location of the failure, if the parser supplied one.
        position: SourcePosition,
    },

    /// A local `$ref` points at a node that does not exist.
    #[from(ignore)]
    #[display("Reference not found: {pointer}")]
    ReferenceNotFound {
        /// The pointer exactly as written in the document.
        pointer: String,
    },

    /// A reference cycle was found while the strict cycle policy is active.
    #[from(ignore)]
    #[display("Reference cycle detected at {pointer}")]
    ReferenceCycle {
        /// The pointer that re-entered resolution.
        pointer: String,
    },

    /// The scanned tree exceeded a configured resource ceiling.
    #[from(ignore)]
    #[display("Scan limit exceeded: {limit} (found {actual})")]
    ScanLimitExceeded {
        /// Which ceiling tripped, e.g. `max_files=5000`.
        limit: String,
        /// The observed amount when the ceiling tripped.
        actual: u64,
    },

    /// The scan root does not exist or is not a directory.
    #[from(ignore)]
    #[display("Scan root not found: {}", _0.display())]
    RootNotFound(PathBuf),

    /// A shell command could not be interpreted as a cURL invocation.
    #[from(ignore)]
    #[display("Malformed cURL command: {_0}")]
    MalformedCommand(String),

    /// The payload shape does not match the declared source kind.
    #[from(ignore)]
    #[display("Payload mismatch: {kind} sources expect {expected}")]
    PayloadMismatch {
        /// Declared source kind.
        kind: SourceKind,
        /// Human readable description of the expected payload.
        expected: &'static str,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// Builds a `DocumentParse` error from a `serde_json` failure.
    pub fn from_json(err: &serde_json::Error) -> Self {
        AppError::DocumentParse {
            message: err.to_string(),
            position: SourcePosition::at(err.line(), err.column()),
        }
    }

    /// Builds a `DocumentParse` error from a `serde_yaml` failure.
    pub fn from_yaml(err: &serde_yaml::Error) -> Self {
        let position = err
            .location()
            .map(|loc| SourcePosition::at(loc.line(), loc.column()))
            .unwrap_or_default();
        AppError::DocumentParse {
            message: err.to_string(),
            position,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// A hard failure surfaced by the facade, annotated with the source kind
/// whose extractor raised it.
#[derive(Debug, Display)]
#[display("{kind} extraction failed: {error}")]
pub struct ExtractionFailure {
    /// The source kind that was being extracted.
    pub kind: SourceKind,
    /// The unmodified extractor error.
    pub error: AppError,
}

impl std::error::Error for ExtractionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_reference_not_found_display_keeps_pointer() {
        let err = AppError::ReferenceNotFound {
            pointer: "#/components/schemas/Missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Reference not found: #/components/schemas/Missing"
        );
    }

    #[test]
    fn test_json_error_carries_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        match AppError::from_json(&err) {
            AppError::DocumentParse { position, .. } => {
                assert_eq!(position.line, Some(2));
                assert!(position.column.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failure_is_annotated_with_kind() {
        let failure = ExtractionFailure {
            kind: SourceKind::Curl,
            error: AppError::MalformedCommand("no URL".into()),
        };
        assert_eq!(
            failure.to_string(),
            "curl extraction failed: Malformed cURL command: no URL"
        );
        assert!(std::error::Error::source(&failure).is_some());
    }
}
