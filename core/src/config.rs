#![deny(missing_docs)]

//! # Extraction Configuration
//!
//! Tunables consumed by the extractors. Callers build an [`ExtractionConfig`]
//! explicitly (or deserialize one from a file); nothing here reads the
//! environment.
//!
//! | field             | default                                  |
//! |-------------------|------------------------------------------|
//! | `extensions`      | `py js mjs cjs jsx ts tsx rs go java kt` |
//! | `ignored_dirs`    | `.git node_modules target venv .venv __pycache__ dist build vendor` |
//! | `max_files`       | `5000`                                   |
//! | `max_total_bytes` | `64 MiB`                                 |
//! | `max_file_bytes`  | `2 MiB`                                  |
//! | `cycle_policy`    | `placeholder`                            |

use crate::cancel::CancellationToken;
use crate::oas::DocumentFormat;
use serde::{Deserialize, Serialize};

/// Default ceiling on the number of candidate source files.
pub const DEFAULT_MAX_FILES: usize = 5_000;

/// Default ceiling on the summed size of candidate source files.
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 64 * 1024 * 1024;

/// Default size above which a single file is skipped with a warning.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// What the reference resolver does when a `$ref` re-enters itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Substitute a self-reference node and warn.
    #[default]
    Placeholder,
    /// Fail the extraction with `ReferenceCycle`.
    Strict,
}

/// Configuration shared by all extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// File extensions (without dot) the source scanner reads.
    pub extensions: Vec<String>,
    /// Directory names the source scanner never descends into.
    pub ignored_dirs: Vec<String>,
    /// Maximum number of candidate files before `ScanLimitExceeded`.
    pub max_files: usize,
    /// Maximum summed size of candidate files before `ScanLimitExceeded`.
    pub max_total_bytes: u64,
    /// Files larger than this are skipped with a warning.
    pub max_file_bytes: u64,
    /// Reference cycle handling.
    pub cycle_policy: CyclePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extensions: [
                "py", "js", "mjs", "cjs", "jsx", "ts", "tsx", "rs", "go", "java", "kt",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignored_dirs: [
                ".git",
                "node_modules",
                "target",
                "venv",
                ".venv",
                "__pycache__",
                "dist",
                "build",
                "vendor",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_files: DEFAULT_MAX_FILES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            cycle_policy: CyclePolicy::default(),
        }
    }
}

impl ExtractionConfig {
    /// Whether a file extension is in the recognized set.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    /// Whether a directory name is excluded from traversal.
    pub fn ignores_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|d| d == name)
    }
}

/// Per-call options passed to the facade.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Extractor configuration.
    pub config: ExtractionConfig,
    /// Format hint for OpenAPI text.
    pub format: DocumentFormat,
    /// Cooperative cancellation and deadline.
    pub cancel: CancellationToken,
}

impl ExtractOptions {
    /// Options with the given configuration and defaults elsewhere.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}
