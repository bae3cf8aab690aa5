#![deny(missing_docs)]

//! # Scan Commands
//!
//! `scan`, `archive` and `repo` all end in the source scanner; they differ
//! only in how the directory is materialized. Temporary checkouts live until
//! the report is built.

use apinorm_core::{extract, synthesize_openapi, ExtractOptions, Payload, SourceKind};
use std::path::{Path, PathBuf};

use crate::error::CliResult;
use crate::materialize::{clone_repository, unpack_zip};
use crate::report::Report;

/// Output selection shared by the scanning commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScanOutput {
    /// Print a synthesized OpenAPI document instead of the raw result.
    #[clap(long)]
    pub emit_openapi: bool,

    /// Title for the synthesized document (defaults to the project name).
    #[clap(long, requires = "emit_openapi")]
    pub title: Option<String>,
}

/// Arguments for the scan command.
#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    /// Root directory of the source tree.
    pub dir: PathBuf,

    /// Output selection.
    #[clap(flatten)]
    pub output: ScanOutput,
}

/// Arguments for the archive command.
#[derive(clap::Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Path to a zip archive.
    pub archive: PathBuf,

    /// Output selection.
    #[clap(flatten)]
    pub output: ScanOutput,
}

/// Arguments for the repo command.
#[derive(clap::Args, Debug, Clone)]
pub struct RepoArgs {
    /// Clone URL of the repository.
    pub url: String,

    /// Branch or tag to check out.
    #[clap(long)]
    pub branch: Option<String>,

    /// Output selection.
    #[clap(flatten)]
    pub output: ScanOutput,
}

/// Scans a local directory.
pub fn execute_scan(args: &ScanArgs, options: &ExtractOptions) -> CliResult<Report> {
    run(SourceKind::Repository, &args.dir, &args.output, options)
}

/// Unpacks and scans an archive.
pub fn execute_archive(args: &ArchiveArgs, options: &ExtractOptions) -> CliResult<Report> {
    let workdir = tempfile::tempdir()?;
    unpack_zip(&args.archive, workdir.path(), &options.config)?;
    let mut report = run(SourceKind::Archive, workdir.path(), &args.output, options)?;
    if let Report::Result(result) = &mut report {
        result.project.title = archive_title(&args.archive).or(result.project.title.take());
    }
    Ok(report)
}

/// Clones and scans a repository.
pub fn execute_repo(args: &RepoArgs, options: &ExtractOptions) -> CliResult<Report> {
    let workdir = tempfile::tempdir()?;
    let checkout = workdir.path().join("checkout");
    clone_repository(&args.url, args.branch.as_deref(), &checkout)?;
    let mut report = run(SourceKind::Repository, &checkout, &args.output, options)?;
    if let Report::Result(result) = &mut report {
        result.project.title = repo_title(&args.url).or(result.project.title.take());
    }
    Ok(report)
}

fn run(
    kind: SourceKind,
    dir: &Path,
    output: &ScanOutput,
    options: &ExtractOptions,
) -> CliResult<Report> {
    let result = extract(kind, &Payload::Directory(dir.to_path_buf()), options)?;
    if !output.emit_openapi {
        return Ok(Report::Result(result));
    }
    let title = output
        .title
        .clone()
        .or_else(|| result.project.title.clone())
        .unwrap_or_else(|| "Scanned API".to_string());
    let doc = synthesize_openapi(&title, &result);
    Ok(Report::Document(serde_json::to_value(doc)?))
}

fn archive_title(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// `https://host/org/name.git` → `name`.
fn repo_title(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .map(|name| name.trim_end_matches(".git").to_string())
        .filter(|name| !name.is_empty())
}
