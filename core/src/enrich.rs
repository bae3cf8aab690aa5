//! # Enrichment
//!
//! Optional post-normalization step that fills in endpoint descriptions.
//! The generator itself (an LLM, a docs service) is an external
//! collaborator plugged in through [`Enricher`]; the core only drives it and
//! never mutates the result it was given.

use crate::error::AppResult;
use crate::models::{EndpointRecord, ExtractionResult, ParamLocation, Warning, WarningKind};

/// Produces a human readable description for one endpoint.
pub trait Enricher: Send + Sync {
    /// Returns the description text for `record`.
    ///
    /// The record's `summary` is context only and should not be repeated.
    fn describe(&self, record: &EndpointRecord) -> AppResult<String>;
}

/// Returns a copy of `result` with descriptions filled in.
///
/// Records that already carry a description keep it. A failing enricher
/// leaves the record untouched and adds an `enrichment_failed` warning after
/// the extractor's own warnings.
pub fn enrich(result: &ExtractionResult, enricher: &dyn Enricher) -> ExtractionResult {
    let mut enriched = result.clone();
    let mut failures = Vec::new();

    for record in enriched.endpoints.iter_mut() {
        if record.description.is_some() {
            continue;
        }
        match enricher.describe(record) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    record.description = Some(text.to_string());
                }
            }
            Err(e) => failures.push(
                Warning::new(WarningKind::EnrichmentFailed, e.to_string())
                    .at(format!("{} {}", record.method, record.path)),
            ),
        }
    }

    enriched.extend_warnings(failures);
    enriched
}

/// Offline enricher describing an endpoint from its own shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEnricher;

impl Enricher for PlaceholderEnricher {
    fn describe(&self, record: &EndpointRecord) -> AppResult<String> {
        let mut text = format!("{} {}.", record.method, record.path);

        let required: Vec<String> = record
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| format!("{} ({})", p.name, location_name(p.location)))
            .collect();
        if !required.is_empty() {
            text.push_str(&format!(" Requires {}.", required.join(", ")));
        }

        if let Some(body) = &record.request_body {
            text.push_str(&format!(" Accepts a {} body.", body.content_type));
        }
        if record.auth.is_required() {
            text.push_str(" Authenticated.");
        }
        Ok(text)
    }
}

fn location_name(location: ParamLocation) -> &'static str {
    match location {
        ParamLocation::Path => "path",
        ParamLocation::Query => "query",
        ParamLocation::Header => "header",
        ParamLocation::Cookie => "cookie",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{
        AuthRequirement, ExtractorKind, HttpMethod, Parameter, Provenance, RequestBody, SchemaNode,
    };
    use pretty_assertions::assert_eq;

    fn record(path: &str, description: Option<&str>) -> EndpointRecord {
        let mut r = EndpointRecord::new(
            HttpMethod::Post,
            path,
            "create",
            Provenance::pointer(ExtractorKind::OpenApi, "#/paths/x/post"),
        );
        r.description = description.map(str::to_string);
        r
    }

    struct Failing;

    impl Enricher for Failing {
        fn describe(&self, _record: &EndpointRecord) -> AppResult<String> {
            Err(AppError::General("quota exceeded".into()))
        }
    }

    #[test]
    fn test_enrich_returns_copy() {
        let mut original = ExtractionResult::new();
        original.push_endpoint(record("/users", None));
        original.push_endpoint(record("/teams", Some("Existing.")));

        let enriched = enrich(&original, &PlaceholderEnricher);

        assert_eq!(original.endpoints[0].description, None);
        assert_eq!(
            enriched.endpoints[0].description.as_deref(),
            Some("POST /users.")
        );
        assert_eq!(
            enriched.endpoints[1].description.as_deref(),
            Some("Existing.")
        );
        assert!(enriched.warnings.is_empty());
    }

    #[test]
    fn test_placeholder_mentions_shape() {
        let mut r = record("/users/{id}", None);
        r.parameters.push(Parameter {
            name: "id".into(),
            location: ParamLocation::Path,
            required: true,
            schema: SchemaNode::string(),
            description: None,
        });
        r.request_body = Some(RequestBody {
            content_type: "application/json".into(),
            required: true,
            schema: Some(SchemaNode::empty_object()),
            raw: None,
        });
        r.auth = AuthRequirement::Basic;

        assert_eq!(
            PlaceholderEnricher.describe(&r).unwrap(),
            "POST /users/{id}. Requires id (path). Accepts a application/json body. Authenticated."
        );
    }

    #[test]
    fn test_failures_become_warnings() {
        let mut original = ExtractionResult::new();
        original.push_endpoint(record("/users", None));

        let enriched = enrich(&original, &Failing);

        assert_eq!(enriched.endpoints, original.endpoints);
        assert_eq!(enriched.warnings.len(), 1);
        assert_eq!(enriched.warnings[0].kind, WarningKind::EnrichmentFailed);
        assert_eq!(enriched.warnings[0].location.as_deref(), Some("POST /users"));
    }
}
