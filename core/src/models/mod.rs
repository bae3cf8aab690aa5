//! # Models
//!
//! Intermediate Representation shared by every extractor and the facade.
//!
//! - **schema**: `SchemaNode`, the canonical data-shape tree.
//! - **endpoint**: `EndpointRecord` and its parts.
//! - **result**: `ExtractionResult`, warnings and project metadata.
//! - **context**: `ProjectContext`, per-call shared state.

pub mod context;
pub mod endpoint;
pub mod result;
pub mod schema;

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use context::{ProjectContext, SecurityAlternative};
pub use endpoint::{
    AuthRequirement, EndpointRecord, ExtractorKind, HttpMethod, ParamLocation, Parameter,
    Provenance, RequestBody, ResponseSpec, SourceLocation,
};
pub use result::{ExtractionResult, ProjectMetadata, Warning, WarningKind};
pub use schema::{PrimitiveKind, SchemaMeta, SchemaNode};

/// The four input kinds the facade dispatches on.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Raw OpenAPI / Swagger document text.
    #[display("openapi")]
    OpenApi,
    /// A pasted cURL command.
    #[display("curl")]
    Curl,
    /// A materialized archive upload.
    #[display("archive")]
    Archive,
    /// A materialized repository checkout.
    #[display("repository")]
    Repository,
}
