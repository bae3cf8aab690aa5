#![deny(missing_docs)]

//! # OpenAPI Command
//!
//! Extracts endpoints from an OpenAPI 3.x or Swagger 2.0 document read from
//! a file, stdin or a URL.

use apinorm_core::{extract, DocumentFormat, ExtractOptions, Payload, SourceKind};
use std::path::PathBuf;

use crate::error::{CliError, CliResult};
use crate::materialize::{fetch_text, read_text};
use crate::report::Report;

/// Document syntax accepted on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// JSON.
    Json,
    /// YAML.
    Yaml,
    /// Sniff the content.
    #[default]
    Auto,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => DocumentFormat::Json,
            FormatArg::Yaml => DocumentFormat::Yaml,
            FormatArg::Auto => DocumentFormat::Auto,
        }
    }
}

/// Arguments for the openapi command.
#[derive(clap::Args, Debug, Clone)]
pub struct OpenApiArgs {
    /// Path to the document (`-` for stdin).
    #[clap(required_unless_present = "url")]
    pub file: Option<PathBuf>,

    /// Fetch the document from this URL instead.
    #[clap(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Document syntax.
    #[clap(long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,
}

/// Executes the extraction.
pub fn execute(args: &OpenApiArgs, options: &ExtractOptions) -> CliResult<Report> {
    let text = match (&args.file, &args.url) {
        (_, Some(url)) => fetch_text(url)?,
        (Some(path), None) => read_text(path)?,
        (None, None) => return Err(CliError::General("No document given".into())),
    };

    let options = ExtractOptions {
        format: args.format.into(),
        ..options.clone()
    };
    let result = extract(SourceKind::OpenApi, &Payload::Text(text), &options)?;
    Ok(Report::Result(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_execute_reads_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("openapi.yaml");
        fs::write(
            &path,
            "openapi: 3.0.0\ninfo: {title: t, version: '1'}\npaths:\n  /ping:\n    get:\n      responses:\n        '200': {description: ok}\n",
        )
        .unwrap();

        let args = OpenApiArgs {
            file: Some(path),
            url: None,
            format: FormatArg::Yaml,
        };
        let Report::Result(result) = execute(&args, &ExtractOptions::default()).unwrap() else {
            panic!("expected a result report");
        };
        assert_eq!(result.endpoints.len(), 1);
        assert_eq!(result.endpoints[0].path, "/ping");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"openapi\": ").unwrap();

        let args = OpenApiArgs {
            file: Some(path),
            url: None,
            format: FormatArg::Auto,
        };
        let err = execute(&args, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::Extraction(_)));
    }
}
