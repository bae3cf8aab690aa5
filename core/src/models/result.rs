//! # Extraction Results
//!
//! Uniform output of every extractor: ordered records plus the non-fatal
//! warnings gathered while building them.

use crate::models::endpoint::EndpointRecord;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Classification of non-fatal findings.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A `$ref` could not be followed (external document, wrong shape).
    #[display("unresolved_reference")]
    UnresolvedReference,
    /// A reference cycle was cut with a placeholder.
    #[display("reference_cycle")]
    ReferenceCycle,
    /// An operation names an undefined security scheme.
    #[display("unknown_security_scheme")]
    UnknownSecurityScheme,
    /// An operation or path item had an unusable shape and was skipped.
    #[display("skipped_operation")]
    SkippedOperation,
    /// A parameter had an unusable shape or location and was skipped.
    #[display("skipped_parameter")]
    SkippedParameter,
    /// The same method and path were discovered in more than one file.
    #[display("ambiguous_route")]
    AmbiguousRoute,
    /// A route registration was recognized but its path is not a literal.
    #[display("unresolved_route")]
    UnresolvedRoute,
    /// A file could not be read or decoded as text.
    #[display("unscannable_file")]
    UnscannableFile,
    /// A cURL flag was not understood and ignored.
    #[display("ignored_curl_flag")]
    IgnoredCurlFlag,
    /// A request body could not be given a structured shape.
    #[display("opaque_body")]
    OpaqueBody,
    /// Cancellation or the deadline stopped extraction early.
    #[display("truncated")]
    Truncated,
    /// The description enricher failed for a record.
    #[display("enrichment_failed")]
    EnrichmentFailed,
}

/// A non-fatal finding attached to an otherwise valid result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Category of the finding.
    pub kind: WarningKind,
    /// Human readable detail.
    pub message: String,
    /// Pointer, `file:line`, or flag the warning is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Warning {
    /// Creates a warning without location.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Attaches a location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Project-level metadata discovered in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// API or project name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// API version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Server URL that endpoint paths are relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Ordered endpoints plus warnings. Every skipped endpoint has a warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Metadata shared by all endpoints.
    pub project: ProjectMetadata,
    /// Records in input order.
    pub endpoints: Vec<EndpointRecord>,
    /// Non-fatal findings, in the order they were raised.
    pub warnings: Vec<Warning>,
}

impl ExtractionResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fully built record.
    pub fn push_endpoint(&mut self, record: EndpointRecord) {
        self.endpoints.push(record);
    }

    /// Records a warning, mirroring it to the tracing subscriber.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(
            kind = %warning.kind,
            location = warning.location.as_deref().unwrap_or("-"),
            "{}",
            warning.message
        );
        self.warnings.push(warning);
    }

    /// Appends warnings collected elsewhere, preserving their order.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for w in warnings {
            self.warn(w);
        }
    }

    /// Whether extraction stopped early.
    pub fn is_truncated(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.kind == WarningKind::Truncated)
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
