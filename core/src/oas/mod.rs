#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! - **document**: JSON / YAML parsing into a `ParsedDocument`.
//! - **resolver**: per-call `$ref` resolution with the cycle guard.
//! - **schemas**: raw schema fragments to `SchemaNode`.
//! - **params**, **body**, **security**: operation parts.
//! - **routes**: the path × verb walk producing endpoint records.

pub mod body;
pub mod context;
pub mod document;
pub mod naming;
pub mod params;
pub(crate) mod ref_utils;
pub mod resolver;
pub mod routes;
pub mod schemas;
pub mod security;

pub use document::{DocumentFormat, ParsedDocument};
pub use resolver::RefResolver;
pub use routes::{extract_from_document, extract_openapi};
pub use schemas::{infer_from_value, normalize_schema};
