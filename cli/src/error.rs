#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use apinorm_core::{AppError, ExtractionFailure};
use derive_more::{Display, From};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// An extractor failed on the given input.
    #[display("{}", _0)]
    Extraction(ExtractionFailure),

    /// A core operation outside extraction failed.
    #[display("{}", _0)]
    Core(AppError),

    /// Output could not be serialized.
    #[display("JSON Error: {}", _0)]
    Json(serde_json::Error),

    /// The configuration file could not be parsed.
    #[display("Config Error: {}", _0)]
    Config(serde_yaml::Error),

    /// The archive could not be unpacked.
    #[display("Archive Error: {}", _0)]
    Archive(zip::result::ZipError),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
///
/// `General(String)` carries no source, so `source()` is written by hand.
impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Extraction(e) => Some(e),
            CliError::Core(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Archive(e) => Some(e),
            CliError::General(_) => None,
        }
    }
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
