#![warn(missing_docs)]

//! # apinorm Core
//!
//! Extracts API endpoints from OpenAPI/Swagger documents, cURL commands and
//! source trees, and normalizes them into one `ExtractionResult` shape.

/// Shared error types.
pub mod error;

/// Extraction settings and per-call options.
pub mod config;

/// Cooperative cancellation and deadlines.
pub mod cancel;

/// Intermediate Representation (endpoints, schemas, results).
pub mod models;

/// OpenAPI / Swagger extraction, reference resolution and schema normalization.
pub mod oas;

/// cURL command extraction.
pub mod curl;

/// Route discovery strategies for source trees.
pub mod strategies;

/// Source tree scanning and OpenAPI synthesis.
pub mod scanner;

/// The single extraction entry point.
pub mod facade;

/// Pluggable description enrichment.
pub mod enrich;

/// Example request templates.
pub mod template;

pub use cancel::CancellationToken;
pub use config::{CyclePolicy, ExtractOptions, ExtractionConfig};
pub use curl::extract_curl;
pub use enrich::{enrich, Enricher, PlaceholderEnricher};
pub use error::{AppError, AppResult, ExtractionFailure, SourcePosition};
pub use facade::{extract, Payload};
pub use models::{
    AuthRequirement, EndpointRecord, ExtractionResult, HttpMethod, ParamLocation, Parameter,
    ProjectMetadata, Provenance, RequestBody, ResponseSpec, SchemaNode, SourceKind, Warning,
    WarningKind,
};
pub use oas::{extract_openapi, DocumentFormat};
pub use scanner::{scan_directory, synthesize_openapi};
pub use strategies::{default_matchers, RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};
pub use template::{request_templates, RequestTemplate};
