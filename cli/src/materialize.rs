//! # Input Materialization
//!
//! Turns command-line inputs into what the core accepts: text for documents
//! and commands, a local directory for archives and repositories.
//!
//! Archive unpacking is bounded by the same ceilings the scanner enforces, so
//! a hostile archive cannot fill the disk before the scan refuses it.

use apinorm_core::{AppError, ExtractionConfig};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::process::Command;

use crate::error::{CliError, CliResult};

/// Hard cap on archive entries, directories included.
const MAX_ARCHIVE_ENTRIES: usize = 100_000;

/// Reads a file, or stdin when `path` is `-`.
pub fn read_text(path: &Path) -> CliResult<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(fs::read_to_string(path)?)
}

/// Downloads a document.
#[cfg(feature = "client")]
pub fn fetch_text(url: &str) -> CliResult<String> {
    tracing::info!(url, "fetching document");
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| CliError::General(format!("Failed to fetch {}: {}", url, e)))?;
    response
        .body_mut()
        .read_to_string()
        .map_err(|e| CliError::General(format!("Failed to read {}: {}", url, e)))
}

/// Downloads a document.
#[cfg(not(feature = "client"))]
pub fn fetch_text(url: &str) -> CliResult<String> {
    Err(CliError::General(format!(
        "Cannot fetch {}: built without the `client` feature",
        url
    )))
}

/// Unpacks a zip archive into `dest`.
///
/// Only entries with a recognized source extension are written. Each entry
/// is cut at one byte over `max_file_bytes` so the scanner still reports it
/// as oversized; the summed output may not exceed `max_total_bytes`.
pub fn unpack_zip(archive_path: &Path, dest: &Path, config: &ExtractionConfig) -> CliResult<usize> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;
    if archive.len() > MAX_ARCHIVE_ENTRIES {
        return Err(CliError::Core(AppError::ScanLimitExceeded {
            limit: format!("max_archive_entries={}", MAX_ARCHIVE_ENTRIES),
            actual: archive.len() as u64,
        }));
    }

    let mut written_bytes: u64 = 0;
    let mut written_files = 0;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        // Entries escaping the destination (`../x`, absolute paths) are dropped.
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(name = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let recognized = relative
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| config.accepts_extension(e));
        if !recognized {
            continue;
        }

        let mut bytes = Vec::new();
        entry.take(config.max_file_bytes + 1).read_to_end(&mut bytes)?;
        written_bytes += bytes.len() as u64;
        if written_bytes > config.max_total_bytes {
            return Err(CliError::Core(AppError::ScanLimitExceeded {
                limit: format!("max_total_bytes={}", config.max_total_bytes),
                actual: written_bytes,
            }));
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &bytes)?;
        written_files += 1;
    }

    tracing::info!(files = written_files, bytes = written_bytes, "archive unpacked");
    Ok(written_files)
}

/// Shallow-clones `url` into `dest` with the system `git`.
///
/// A URL or branch starting with `-` is refused; git would read it as an option.
pub fn clone_repository(url: &str, branch: Option<&str>, dest: &Path) -> CliResult<()> {
    if url.trim_start().starts_with('-') || branch.is_some_and(|b| b.starts_with('-')) {
        return Err(CliError::General(format!(
            "Refusing repository argument that looks like an option: {}",
            url
        )));
    }
    let mut cmd = Command::new("git");
    cmd.args(["clone", "--depth", "1", "--quiet"]);
    if let Some(branch) = branch {
        cmd.args(["--branch", branch]);
    }
    cmd.arg("--").arg(url).arg(dest);

    tracing::info!(url, "cloning repository");
    let output = cmd
        .output()
        .map_err(|e| CliError::General(format!("Failed to run git: {}", e)))?;
    if !output.status.success() {
        return Err(CliError::General(format!(
            "git clone failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_unpack_keeps_source_files_only() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("src.zip");
        write_zip(
            &archive,
            &[
                ("app/main.py", "@app.get('/ping')\ndef ping(): ...\n"),
                ("app/logo.png", "not really a png"),
                ("../escape.py", "x = 1\n"),
            ],
        );
        let out = tempdir().unwrap();

        let count = unpack_zip(&archive, out.path(), &ExtractionConfig::default()).unwrap();

        assert_eq!(count, 1);
        assert!(out.path().join("app/main.py").exists());
        assert!(!out.path().join("app/logo.png").exists());
    }

    #[test]
    fn test_unpack_enforces_total_size() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("big.zip");
        let body = "x".repeat(64);
        write_zip(&archive, &[("a.py", body.as_str()), ("b.py", body.as_str())]);
        let config = ExtractionConfig {
            max_total_bytes: 100,
            ..ExtractionConfig::default()
        };
        let out = tempdir().unwrap();

        match unpack_zip(&archive, out.path(), &config) {
            Err(CliError::Core(AppError::ScanLimitExceeded { limit, actual })) => {
                assert_eq!(limit, "max_total_bytes=100");
                assert_eq!(actual, 128);
            }
            other => panic!("expected ScanLimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_entry_is_cut() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("one.zip");
        write_zip(&archive, &[("a.go", "0123456789")]);
        let config = ExtractionConfig {
            max_file_bytes: 4,
            ..ExtractionConfig::default()
        };
        let out = tempdir().unwrap();

        unpack_zip(&archive, out.path(), &config).unwrap();
        assert_eq!(fs::read(out.path().join("a.go")).unwrap().len(), 5);
    }

    #[test]
    fn test_clone_refuses_option_like_arguments() {
        let out = tempdir().unwrap();
        let dest = out.path().join("checkout");
        let err = clone_repository("--upload-pack=touch /tmp/pwned", None, &dest).unwrap_err();
        assert!(matches!(err, CliError::General(ref msg) if msg.contains("looks like an option")));
        assert!(clone_repository("https://example.com/r.git", Some("-b"), &dest).is_err());
        assert!(!dest.exists());
    }
}
