//! # Source Scanner
//!
//! Discovers endpoints in a materialized source tree by running the route
//! matchers from [`crate::strategies`] over every recognized file.
//!
//! - **paths**: template normalization and path parameter synthesis.
//! - **synth**: renders scan results as a partial OpenAPI document.
//!
//! The only hard failures are a missing root and a tripped resource ceiling.
//! Unreadable files, duplicate routes and cancellation are warnings.

pub mod paths;
pub mod synth;

use crate::cancel::CancellationToken;
use crate::config::ExtractionConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthRequirement, EndpointRecord, ExtractionResult, HttpMethod, ProjectContext, ProjectMetadata,
    Provenance, Warning, WarningKind,
};
use crate::oas::naming::operation_name;
use crate::strategies::{default_matchers, RouteMatch, RouteMatcher, UnresolvedRoute};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use paths::{join_paths, normalize_template, PathParam};
pub use synth::synthesize_openapi;

/// A file selected for scanning.
#[derive(Debug, Clone)]
struct Candidate {
    absolute: PathBuf,
    relative: PathBuf,
    size: u64,
}

/// What scanning one file produced.
enum FileOutcome {
    Routes(Vec<RouteMatch>, Vec<UnresolvedRoute>),
    Unscannable(Warning),
    Skipped,
}

/// Scans `root` with the built-in matchers.
pub fn scan_directory(
    root: &Path,
    config: &ExtractionConfig,
    cancel: &CancellationToken,
) -> AppResult<ExtractionResult> {
    scan_with_matchers(root, config, cancel, &default_matchers())
}

/// Scans `root` with a caller supplied matcher set.
///
/// Files are scanned in parallel and merged back in traversal order, so the
/// output does not depend on thread scheduling.
pub fn scan_with_matchers(
    root: &Path,
    config: &ExtractionConfig,
    cancel: &CancellationToken,
    matchers: &[Box<dyn RouteMatcher>],
) -> AppResult<ExtractionResult> {
    if !root.is_dir() {
        return Err(AppError::RootNotFound(root.to_path_buf()));
    }

    let mut result = ExtractionResult::new();
    let candidates = collect_candidates(root, config, &mut result)?;
    tracing::debug!(root = %root.display(), files = candidates.len(), "scan candidates collected");

    let outcomes: Vec<FileOutcome> = candidates
        .par_iter()
        .map(|candidate| {
            if cancel.is_cancelled() {
                return FileOutcome::Skipped;
            }
            scan_file(candidate, config, matchers)
        })
        .collect();

    let mut ctx = ProjectContext::with_metadata(ProjectMetadata {
        title: root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
        version: None,
        base_url: None,
    });
    let mut seen: IndexMap<(HttpMethod, String), Vec<(PathBuf, usize)>> = IndexMap::new();
    let mut skipped = 0usize;

    for (candidate, outcome) in candidates.iter().zip(outcomes) {
        match outcome {
            FileOutcome::Skipped => skipped += 1,
            FileOutcome::Unscannable(warning) => result.warn(warning),
            FileOutcome::Routes(routes, unresolved) => {
                for site in unresolved {
                    result.warn(
                        Warning::new(
                            WarningKind::UnresolvedRoute,
                            format!("route path is not a literal: {}", site.snippet),
                        )
                        .at(format!("{}:{}", candidate.relative.display(), site.line)),
                    );
                }
                for route in routes {
                    let line = route.line;
                    let record = build_record(&mut ctx, candidate, route);
                    seen.entry((record.method, record.path.clone()))
                        .or_default()
                        .push((candidate.relative.clone(), line));
                    result.push_endpoint(record);
                }
            }
        }
    }

    for ((method, path), sites) in &seen {
        let Some((first, _)) = sites.first() else {
            continue;
        };
        if sites.iter().all(|(file, _)| file == first) {
            continue;
        }
        let listed: Vec<String> = sites
            .iter()
            .map(|(file, line)| format!("{}:{}", file.display(), line))
            .collect();
        result.warn(
            Warning::new(
                WarningKind::AmbiguousRoute,
                format!(
                    "{} {} is registered in more than one file: {}",
                    method,
                    path,
                    listed.join(", ")
                ),
            )
            .at(format!("{} {}", method, path)),
        );
    }

    if skipped > 0 {
        result.warn(Warning::new(
            WarningKind::Truncated,
            format!("scan cancelled: {} of {} files not scanned", skipped, candidates.len()),
        ));
    }

    result.project = ctx.metadata;
    tracing::info!(
        endpoints = result.endpoints.len(),
        warnings = result.warnings.len(),
        "source scan finished"
    );
    Ok(result)
}

/// Walks `root` in file-name order, enforcing the configured ceilings.
fn collect_candidates(
    root: &Path,
    config: &ExtractionConfig,
    result: &mut ExtractionResult,
) -> AppResult<Vec<Candidate>> {
    let mut files = Vec::new();
    let mut total_bytes: u64 = 0;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| config.ignores_dir(name))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let location = err
                    .path()
                    .map(|p| relative_to(root, p).display().to_string())
                    .unwrap_or_default();
                result.warn(
                    Warning::new(WarningKind::UnscannableFile, format!("cannot read entry: {}", err))
                        .at(location),
                );
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let accepted = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.accepts_extension(ext));
        if !accepted {
            continue;
        }

        if files.len() >= config.max_files {
            return Err(AppError::ScanLimitExceeded {
                limit: format!("max_files={}", config.max_files),
                actual: files.len() as u64 + 1,
            });
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        total_bytes = total_bytes.saturating_add(size);
        if total_bytes > config.max_total_bytes {
            return Err(AppError::ScanLimitExceeded {
                limit: format!("max_total_bytes={}", config.max_total_bytes),
                actual: total_bytes,
            });
        }

        files.push(Candidate {
            absolute: entry.path().to_path_buf(),
            relative: relative_to(root, entry.path()),
            size,
        });
    }
    Ok(files)
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn scan_file(
    candidate: &Candidate,
    config: &ExtractionConfig,
    matchers: &[Box<dyn RouteMatcher>],
) -> FileOutcome {
    let location = candidate.relative.display().to_string();
    if candidate.size > config.max_file_bytes {
        return FileOutcome::Unscannable(
            Warning::new(
                WarningKind::UnscannableFile,
                format!(
                    "file is {} bytes, above max_file_bytes={}",
                    candidate.size, config.max_file_bytes
                ),
            )
            .at(location),
        );
    }

    let bytes = match std::fs::read(&candidate.absolute) {
        Ok(bytes) => bytes,
        Err(err) => {
            return FileOutcome::Unscannable(
                Warning::new(WarningKind::UnscannableFile, format!("cannot read file: {}", err))
                    .at(location),
            )
        }
    };
    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(_) => {
            return FileOutcome::Unscannable(
                Warning::new(WarningKind::UnscannableFile, "file is not valid UTF-8 text")
                    .at(location),
            )
        }
    };

    let extension = candidate
        .absolute
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let mut routes: Vec<RouteMatch> = Vec::new();
    let mut unresolved: Vec<UnresolvedRoute> = Vec::new();
    for matcher in matchers.iter().filter(|m| m.applies_to(extension)) {
        let found = matcher.scan_source(&source);
        if !found.routes.is_empty() || !found.unresolved.is_empty() {
            tracing::debug!(
                file = %location,
                matcher = matcher.name(),
                routes = found.routes.len(),
                unresolved = found.unresolved.len(),
                "routes matched"
            );
        }
        routes.extend(found.routes);
        unresolved.extend(found.unresolved);
    }
    routes.sort_by_key(|r| r.line);
    unresolved.sort_by_key(|u| u.line);
    FileOutcome::Routes(routes, unresolved)
}

fn build_record(ctx: &mut ProjectContext, candidate: &Candidate, route: RouteMatch) -> EndpointRecord {
    let (template, params) = normalize_template(&route.path);
    let candidate_id = operation_name(route.handler.as_deref(), route.method.as_lower(), &template);
    let operation_id = ctx.unique_operation_id(&candidate_id);

    let mut record = EndpointRecord::new(
        route.method,
        template,
        operation_id,
        Provenance::file(candidate.relative.clone(), route.line, route.snippet),
    );
    record.parameters = params.iter().map(PathParam::to_parameter).collect();
    if route.authenticated {
        record.auth = AuthRequirement::Bearer { format: None };
    }
    record
}
