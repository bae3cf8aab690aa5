#![deny(missing_docs)]

//! # apinorm CLI
//!
//! Command Line Interface around the extraction core. The CLI is the
//! caller-side collaborator: it reads files, fetches URLs, unpacks archives
//! and clones repositories, then prints the normalized result as JSON.
//!
//! Supported Commands:
//! - `openapi`: Extract from an OpenAPI / Swagger document.
//! - `curl`: Extract from a cURL command.
//! - `scan`: Scan a local source tree.
//! - `archive`: Unpack a zip archive and scan it.
//! - `repo`: Shallow-clone a git repository and scan it.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;
use crate::settings::GlobalArgs;

mod curl;
mod error;
mod materialize;
mod openapi;
mod report;
mod scan;
mod settings;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Multi-source API extraction and normalization")]
struct Cli {
    #[clap(flatten)]
    global: GlobalArgs,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract endpoints from an OpenAPI / Swagger document.
    Openapi(openapi::OpenApiArgs),
    /// Extract the endpoint described by a cURL command.
    Curl(curl::CurlArgs),
    /// Scan a local source tree for route registrations.
    Scan(scan::ScanArgs),
    /// Unpack a zip archive and scan its contents.
    Archive(scan::ArchiveArgs),
    /// Shallow-clone a git repository and scan it.
    Repo(scan::RepoArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> CliResult<()> {
    let options = cli.global.extract_options()?;

    let report = match &cli.command {
        Commands::Openapi(args) => openapi::execute(args, &options)?,
        Commands::Curl(args) => curl::execute(args, &options)?,
        Commands::Scan(args) => scan::execute_scan(args, &options)?,
        Commands::Archive(args) => scan::execute_archive(args, &options)?,
        Commands::Repo(args) => scan::execute_repo(args, &options)?,
    };

    report.print(&cli.global)
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
