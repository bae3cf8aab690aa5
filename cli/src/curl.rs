#![deny(missing_docs)]

//! # cURL Command
//!
//! Extracts the single endpoint a pasted cURL command calls.

use apinorm_core::{extract, ExtractOptions, Payload, SourceKind};
use std::path::PathBuf;

use crate::error::{CliError, CliResult};
use crate::materialize::read_text;
use crate::report::Report;

/// Arguments for the curl command.
#[derive(clap::Args, Debug, Clone)]
pub struct CurlArgs {
    /// The command text, quoted as one argument.
    #[clap(required_unless_present = "file")]
    pub command: Option<String>,

    /// Read the command from a file (`-` for stdin).
    #[clap(short, long, conflicts_with = "command")]
    pub file: Option<PathBuf>,
}

/// Executes the extraction.
pub fn execute(args: &CurlArgs, options: &ExtractOptions) -> CliResult<Report> {
    let command = match (&args.command, &args.file) {
        (Some(command), _) => command.clone(),
        (None, Some(path)) => read_text(path)?,
        (None, None) => return Err(CliError::General("No command given".into())),
    };
    let result = extract(SourceKind::Curl, &Payload::Text(command), options)?;
    Ok(Report::Result(result))
}
