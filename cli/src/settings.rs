#![deny(missing_docs)]

//! # Settings
//!
//! Global flags and the optional configuration file, turned into the
//! `ExtractOptions` every command hands to the core.

use apinorm_core::{CancellationToken, ExtractOptions, ExtractionConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CliResult;

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Stop extraction after this many milliseconds; partial results are kept.
    #[clap(long, global = true, env = "APINORM_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// YAML or JSON file with extraction settings (extensions, limits, cycle policy).
    #[clap(long, global = true, env = "APINORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also print request templates, optionally against this base URL.
    #[clap(long, global = true, num_args = 0..=1, default_missing_value = "")]
    pub templates: Option<String>,

    /// Fill missing endpoint descriptions with generated placeholders.
    #[clap(long, global = true)]
    pub describe: bool,

    /// Print compact JSON instead of pretty JSON.
    #[clap(long, global = true)]
    pub compact: bool,
}

impl GlobalArgs {
    /// Builds the options for one extraction call.
    pub fn extract_options(&self) -> CliResult<ExtractOptions> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => ExtractionConfig::default(),
        };
        let mut options = ExtractOptions::with_config(config);
        if let Some(ms) = self.timeout_ms {
            options.cancel = CancellationToken::with_timeout(Duration::from_millis(ms));
        }
        Ok(options)
    }
}

/// Reads an `ExtractionConfig`; missing keys keep their defaults.
pub fn load_config(path: &Path) -> CliResult<ExtractionConfig> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(ExtractionConfig::default());
    }
    let config: ExtractionConfig = serde_yaml::from_str(&text)?;
    tracing::debug!(path = %path.display(), "loaded extraction config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apinorm_core::CyclePolicy;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apinorm.yaml");
        fs::write(&path, "max_files: 10\ncycle_policy: strict\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.max_files, 10);
        assert_eq!(config.cycle_policy, CyclePolicy::Strict);
        assert_eq!(config.extensions, ExtractionConfig::default().extensions);
    }

    #[test]
    fn test_json_config_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apinorm.json");
        fs::write(&path, r#"{"extensions": ["py"]}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.extensions, vec!["py".to_string()]);
    }

    #[test]
    fn test_timeout_sets_deadline() {
        let args = GlobalArgs {
            timeout_ms: Some(0),
            ..GlobalArgs::default()
        };
        let options = args.extract_options().unwrap();
        assert!(options.cancel.is_cancelled());
    }
}
