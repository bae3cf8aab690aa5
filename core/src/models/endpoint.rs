//! # Endpoint Records
//!
//! The normalized representation of one callable API operation, independent
//! of which extractor produced it.

use crate::models::schema::SchemaNode;
use derive_more::Display;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Standard HTTP verbs.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[display("GET")]
    Get,
    /// POST
    #[display("POST")]
    Post,
    /// PUT
    #[display("PUT")]
    Put,
    /// PATCH
    #[display("PATCH")]
    Patch,
    /// DELETE
    #[display("DELETE")]
    Delete,
    /// HEAD
    #[display("HEAD")]
    Head,
    /// OPTIONS
    #[display("OPTIONS")]
    Options,
    /// TRACE
    #[display("TRACE")]
    Trace,
}

impl HttpMethod {
    /// Every verb, in the order OpenAPI path items list them.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Case-insensitive parse.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Lowercase form used as an OpenAPI path-item key.
    pub fn as_lower(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }
}

/// Where a parameter is carried.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Path segment.
    #[display("path")]
    Path,
    /// Query string.
    #[display("query")]
    Query,
    /// Request header.
    #[display("header")]
    Header,
    /// Cookie.
    #[display("cookie")]
    Cookie,
}

impl ParamLocation {
    /// Parses an OpenAPI `in` value.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// A single named input of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name as sent on the wire.
    pub name: String,
    /// Where the value travels.
    pub location: ParamLocation,
    /// Always `true` for path parameters.
    pub required: bool,
    /// Value shape.
    pub schema: SchemaNode,
    /// Free text from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request payload description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Media type, e.g. `application/json`.
    pub content_type: String,
    /// Whether the body must be sent.
    pub required: bool,
    /// Structured shape, when one could be derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
    /// Opaque payload text for bodies without a structured shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// A declared response for one status key (`200`, `4XX`, `default`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// Response description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First declared media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Payload shape for that media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

/// Authentication an endpoint expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthRequirement {
    /// Public endpoint.
    #[default]
    None,
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// Token format hint such as `JWT`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// `Authorization: Basic <credentials>`.
    Basic,
    /// Static key carried in a header, query parameter or cookie.
    ApiKey {
        /// Header, query or cookie name.
        name: String,
        /// Where the key travels.
        location: ParamLocation,
    },
    /// The operation names a scheme the document never defines.
    Unknown {
        /// The undefined scheme name.
        scheme: String,
    },
}

impl AuthRequirement {
    /// Whether a caller must present credentials.
    pub fn is_required(&self) -> bool {
        !matches!(self, AuthRequirement::None)
    }
}

/// Which extractor built a record.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// OpenAPI / Swagger document.
    #[display("openapi")]
    OpenApi,
    /// cURL command.
    #[display("curl")]
    Curl,
    /// Source tree scan.
    #[display("source_scanner")]
    SourceScanner,
}

/// Where in the input a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceLocation {
    /// JSON pointer into the parsed document.
    Pointer {
        /// `#/paths/...` pointer of the operation.
        pointer: String,
    },
    /// File path relative to the scan root, with 1-based line.
    File {
        /// Path relative to the scan root.
        path: PathBuf,
        /// 1-based line of the registration.
        line: usize,
    },
    /// The whole command text.
    Command,
}

/// Audit trail for a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Extractor that built the record.
    pub extractor: ExtractorKind,
    /// Position in the input.
    pub location: SourceLocation,
    /// Short excerpt of the input that produced the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Provenance {
    /// Provenance for a record built from a document operation.
    pub fn pointer(extractor: ExtractorKind, pointer: impl Into<String>) -> Self {
        Self {
            extractor,
            location: SourceLocation::Pointer {
                pointer: pointer.into(),
            },
            snippet: None,
        }
    }

    /// Provenance for a record discovered at a file/line.
    pub fn file(path: impl Into<PathBuf>, line: usize, snippet: impl Into<String>) -> Self {
        Self {
            extractor: ExtractorKind::SourceScanner,
            location: SourceLocation::File {
                path: path.into(),
                line,
            },
            snippet: Some(snippet.into()),
        }
    }
}

/// One normalized operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path template as written, with `{param}` placeholders.
    pub path: String,
    /// Unique identifier within one extraction call.
    pub operation_id: String,
    /// One-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Marked deprecated in the source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Path, query, header and cookie inputs.
    pub parameters: Vec<Parameter>,
    /// Request payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status (`200`, `4XX`, `default`).
    pub responses: IndexMap<String, ResponseSpec>,
    /// Authentication the endpoint expects.
    pub auth: AuthRequirement,
    /// Where the record came from.
    pub provenance: Provenance,
}

impl EndpointRecord {
    /// A record with no parameters, body, responses or auth.
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        operation_id: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            parameters: Vec::new(),
            request_body: None,
            responses: IndexMap::new(),
            auth: AuthRequirement::None,
            provenance,
        }
    }

    /// Lookup by name and location.
    pub fn parameter(&self, name: &str, location: ParamLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    /// Compares everything except provenance.
    pub fn same_shape(&self, other: &EndpointRecord) -> bool {
        let mut left = self.clone();
        left.provenance = other.provenance.clone();
        left == *other
    }
}
