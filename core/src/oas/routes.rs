#![deny(missing_docs)]

//! # OpenAPI Extraction
//!
//! Entry point for turning an OpenAPI 3.x / Swagger 2.0 document into
//! [`EndpointRecord`]s: one per path-item × declared verb.
//!
//! Operations are built one at a time against a per-call [`RefResolver`].
//! The cancellation token is checked before each operation, so a record is
//! either fully built and appended or not started.

use crate::cancel::CancellationToken;
use crate::config::ExtractionConfig;
use crate::error::AppResult;
use crate::models::{
    EndpointRecord, ExtractionResult, ExtractorKind, HttpMethod, ProjectContext, Provenance,
    Warning, WarningKind,
};
use crate::oas::body::{resolve_request_body, resolve_responses, split_legacy_body};
use crate::oas::context::build_context;
use crate::oas::document::{DocumentFormat, ParsedDocument};
use crate::oas::naming::operation_name;
use crate::oas::params::{merge_parameters, resolve_parameters, ResolvedParam};
use crate::oas::ref_utils::child_pointer;
use crate::oas::resolver::RefResolver;
use crate::oas::security::resolve_auth;
use serde_json::{Map, Value};

/// Parses `text` and extracts every operation.
///
/// Fails with `DocumentParse` on malformed text and with `ReferenceNotFound`
/// when a local `$ref` points nowhere.
pub fn extract_openapi(
    text: &str,
    format: DocumentFormat,
    config: &ExtractionConfig,
    cancel: &CancellationToken,
) -> AppResult<ExtractionResult> {
    let doc = ParsedDocument::parse(text, format)?;
    extract_from_document(&doc, config, cancel)
}

/// Document-wide Swagger 2.0 media type defaults.
struct MediaDefaults {
    consumes: Vec<String>,
    produces: Vec<String>,
}

/// Extracts every operation of an already parsed document.
pub fn extract_from_document(
    doc: &ParsedDocument,
    config: &ExtractionConfig,
    cancel: &CancellationToken,
) -> AppResult<ExtractionResult> {
    let root = doc.root();
    let mut resolver = RefResolver::for_document(doc, config.cycle_policy);
    let mut ctx = build_context(doc, &mut resolver)?;

    let mut result = ExtractionResult::new();
    result.project = ctx.metadata.clone();
    result.extend_warnings(resolver.take_warnings());

    let media = MediaDefaults {
        consumes: string_list(root.get("consumes")),
        produces: string_list(root.get("produces")),
    };

    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
        tracing::info!("document declares no paths");
        return Ok(result);
    };

    'paths: for (path, raw_item) in paths {
        if path.starts_with("x-") {
            continue;
        }
        let item_pointer = child_pointer("#/paths", path);

        let item = match resolver.deref(raw_item)? {
            Some(Value::Object(item)) => item,
            Some(_) => {
                resolver.warn(
                    Warning::new(WarningKind::SkippedOperation, "path item is not an object")
                        .at(&item_pointer),
                );
                result.extend_warnings(resolver.take_warnings());
                continue;
            }
            None => {
                result.extend_warnings(resolver.take_warnings());
                continue;
            }
        };

        let path_params = resolve_parameters(
            item.get("parameters"),
            &child_pointer(&item_pointer, "parameters"),
            &mut resolver,
        )?;
        result.extend_warnings(resolver.take_warnings());

        for method in HttpMethod::ALL {
            let Some(raw_op) = item.get(method.as_lower()) else {
                continue;
            };
            if cancel.is_cancelled() {
                result.warn(
                    Warning::new(
                        WarningKind::Truncated,
                        format!(
                            "extraction cancelled after {} operation(s)",
                            result.endpoints.len()
                        ),
                    )
                    .at(child_pointer(&item_pointer, method.as_lower())),
                );
                break 'paths;
            }

            let op_pointer = child_pointer(&item_pointer, method.as_lower());
            let Value::Object(op) = raw_op else {
                resolver.warn(
                    Warning::new(WarningKind::SkippedOperation, "operation is not an object")
                        .at(&op_pointer),
                );
                result.extend_warnings(resolver.take_warnings());
                continue;
            };

            tracing::debug!(method = %method, path = %path, "building operation");
            let record = build_operation(OperationSource {
                method,
                path,
                pointer: &op_pointer,
                operation: op,
                path_params: &path_params,
                media: &media,
                ctx: &mut ctx,
                resolver: &mut resolver,
            })?;
            result.extend_warnings(resolver.take_warnings());
            result.push_endpoint(record);
        }
    }

    tracing::info!(
        endpoints = result.endpoints.len(),
        warnings = result.warnings.len(),
        "openapi extraction finished"
    );
    Ok(result)
}

/// Everything needed to build one record.
struct OperationSource<'a, 'doc> {
    method: HttpMethod,
    path: &'a str,
    pointer: &'a str,
    operation: &'a Map<String, Value>,
    path_params: &'a [ResolvedParam],
    media: &'a MediaDefaults,
    ctx: &'a mut ProjectContext,
    resolver: &'a mut RefResolver<'doc>,
}

fn build_operation(src: OperationSource<'_, '_>) -> AppResult<EndpointRecord> {
    let OperationSource {
        method,
        path,
        pointer,
        operation,
        path_params,
        media,
        ctx,
        resolver,
    } = src;

    let own_params = resolve_parameters(
        operation.get("parameters"),
        &child_pointer(pointer, "parameters"),
        resolver,
    )?;
    let merged = merge_parameters(path_params.to_vec(), own_params);

    let consumes = match operation.get("consumes") {
        Some(list) => string_list(Some(list)),
        None => media.consumes.clone(),
    };
    let produces = match operation.get("produces") {
        Some(list) => string_list(Some(list)),
        None => media.produces.clone(),
    };

    let (parameters, legacy_body) = split_legacy_body(merged, &consumes);
    let request_body = match resolve_request_body(operation.get("requestBody"), resolver)? {
        Some(body) => Some(body),
        None => legacy_body,
    };
    let responses = resolve_responses(operation.get("responses"), &produces, resolver)?;

    let (auth, auth_warning) = resolve_auth(
        operation.get("security"),
        ctx.global_security.as_deref(),
        &ctx.schemes,
        pointer,
    );
    if let Some(warning) = auth_warning {
        resolver.warn(warning);
    }

    let text = |key: &str| {
        operation
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let declared_id = operation.get("operationId").and_then(Value::as_str);
    let operation_id =
        ctx.unique_operation_id(&operation_name(declared_id, method.as_lower(), path));

    let mut record = EndpointRecord::new(
        method,
        path,
        operation_id,
        Provenance::pointer(ExtractorKind::OpenApi, pointer),
    );
    record.summary = text("summary");
    record.description = text("description");
    record.tags = string_list(operation.get("tags"));
    record.deprecated = operation
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    record.parameters = parameters;
    record.request_body = request_body;
    record.responses = responses;
    record.auth = auth;
    Ok(record)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CyclePolicy;
    use crate::error::AppError;
    use crate::models::{AuthRequirement, ParamLocation, SchemaNode, SourceLocation};
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> ExtractionResult {
        extract_openapi(
            text,
            DocumentFormat::Auto,
            &ExtractionConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    const PETSTORE: &str = r#"
openapi: 3.0.3
info: {title: Pets, version: 1.0.0}
servers: [{url: "https://pets.example.com/v1"}]
security:
  - bearerAuth: []
components:
  securitySchemes:
    bearerAuth: {type: http, scheme: bearer}
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: {type: string}
        owner: {$ref: '#/components/schemas/Owner'}
    Owner:
      type: object
      properties:
        pets: {type: array, items: {$ref: '#/components/schemas/Pet'}}
paths:
  /pets/:
    parameters:
      - {name: limit, in: query, schema: {type: integer}}
      - {name: X-Trace, in: header, description: inherited}
    get:
      operationId: listPets
      tags: [pets]
      parameters:
        - {name: X-Trace, in: header, description: own}
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: {type: array, items: {$ref: '#/components/schemas/Pet'}}
    post:
      summary: Create a pet
      security: []
      requestBody:
        required: true
        content:
          application/json:
            schema: {$ref: '#/components/schemas/Pet'}
      responses:
        '201': {description: created}
  /pets/{id}:
    delete:
      security:
        - ghost: []
      parameters:
        - {name: id, in: path, schema: {type: string}}
      responses:
        default: {description: error}
"#;

    #[test]
    fn test_one_record_per_path_and_verb() {
        let result = extract(PETSTORE);
        let pairs: Vec<(HttpMethod, &str)> = result
            .endpoints
            .iter()
            .map(|e| (e.method, e.path.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (HttpMethod::Get, "/pets/"),
                (HttpMethod::Post, "/pets/"),
                (HttpMethod::Delete, "/pets/{id}"),
            ]
        );
        assert_eq!(
            result.project.base_url.as_deref(),
            Some("https://pets.example.com/v1")
        );
    }

    #[test]
    fn test_parameter_merge_and_override() {
        let result = extract(PETSTORE);
        let get = &result.endpoints[0];
        assert_eq!(get.operation_id, "list_pets");
        assert_eq!(get.tags, vec!["pets".to_string()]);
        let names: Vec<&str> = get.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["X-Trace", "limit"]);
        assert_eq!(
            get.parameter("X-Trace", ParamLocation::Header)
                .and_then(|p| p.description.as_deref()),
            Some("own")
        );
    }

    #[test]
    fn test_security_fallbacks() {
        let result = extract(PETSTORE);
        assert_eq!(
            result.endpoints[0].auth,
            AuthRequirement::Bearer { format: None }
        );
        assert_eq!(result.endpoints[1].auth, AuthRequirement::None);
        assert_eq!(
            result.endpoints[2].auth,
            AuthRequirement::Unknown {
                scheme: "ghost".into()
            }
        );
        let unknown: Vec<&Warning> = result
            .warnings_of(WarningKind::UnknownSecurityScheme)
            .collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].location.as_deref(), Some("#/paths/~1pets~1{id}/delete"));
    }

    #[test]
    fn test_recursive_schema_is_cut_and_reported() {
        let result = extract(PETSTORE);
        let body = result.endpoints[1].request_body.as_ref().unwrap();
        assert!(body.required);
        let pet = body.schema.as_ref().unwrap();
        let owner = pet.field("owner").unwrap();
        match owner.field("pets") {
            Some(SchemaNode::Array { items, .. }) => assert_eq!(
                **items,
                SchemaNode::SelfReference {
                    pointer: "#/components/schemas/Pet".into()
                }
            ),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(result.warnings_of(WarningKind::ReferenceCycle).count() >= 1);
        assert!(result.endpoints.iter().all(|e| e
            .request_body
            .as_ref()
            .and_then(|b| b.schema.as_ref())
            .map_or(true, |s| !s.contains_reference())));
    }

    #[test]
    fn test_provenance_pointer() {
        let result = extract(PETSTORE);
        assert_eq!(
            result.endpoints[2].provenance.location,
            SourceLocation::Pointer {
                pointer: "#/paths/~1pets~1{id}/delete".into()
            }
        );
    }

    #[test]
    fn test_missing_reference_is_fatal() {
        let err = extract_openapi(
            r##"{"openapi": "3.0.0", "paths": {"/a": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Nope"}}}
            }}}}}}"##,
            DocumentFormat::Json,
            &ExtractionConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap_err();
        match err {
            AppError::ReferenceNotFound { pointer } => {
                assert_eq!(pointer, "#/components/schemas/Nope")
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_strict_cycle_policy_fails() {
        let config = ExtractionConfig {
            cycle_policy: CyclePolicy::Strict,
            ..ExtractionConfig::default()
        };
        let err = extract_openapi(
            PETSTORE,
            DocumentFormat::Auto,
            &config,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ReferenceCycle { .. }));
    }

    #[test]
    fn test_cancelled_token_truncates() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = extract_openapi(
            PETSTORE,
            DocumentFormat::Auto,
            &ExtractionConfig::default(),
            &cancel,
        )
        .unwrap();
        assert!(result.endpoints.is_empty());
        assert!(result.is_truncated());
    }

    #[test]
    fn test_swagger2_body_and_form() {
        let result = extract(
            r#"
swagger: "2.0"
info: {title: Legacy, version: "1"}
host: legacy.example.com
consumes: [application/json]
paths:
  /items:
    post:
      parameters:
        - {name: item, in: body, required: true, schema: {type: object, properties: {sku: {type: string}}}}
      responses:
        200: {description: ok, schema: {type: integer}}
  /upload:
    post:
      consumes: [multipart/form-data]
      parameters:
        - {name: file, in: formData, type: file, required: true}
        - {name: note, in: formData, type: string}
      responses:
        200: {description: ok}
"#,
        );
        let items = &result.endpoints[0];
        let body = items.request_body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert!(body.schema.as_ref().unwrap().field("sku").is_some());
        assert!(items.parameters.is_empty());
        assert!(items.responses["200"].schema.is_some());

        let upload = result.endpoints[1].request_body.as_ref().unwrap();
        assert_eq!(upload.content_type, "multipart/form-data");
        assert_eq!(
            result.project.base_url.as_deref(),
            Some("https://legacy.example.com")
        );
    }

    #[test]
    fn test_duplicate_operation_ids_are_suffixed() {
        let result = extract(
            r#"{"openapi": "3.0.0", "paths": {
                "/a": {"get": {"operationId": "fetch"}},
                "/b": {"get": {"operationId": "fetch"}}
            }}"#,
        );
        let ids: Vec<&str> = result
            .endpoints
            .iter()
            .map(|e| e.operation_id.as_str())
            .collect();
        assert_eq!(ids, vec!["fetch", "fetch_2"]);
    }

    #[test]
    fn test_malformed_operation_is_skipped_with_warning() {
        let result = extract(r#"{"openapi": "3.0.0", "paths": {"/a": {"get": "oops", "post": {}}}}"#);
        assert_eq!(result.endpoints.len(), 1);
        assert_eq!(result.warnings_of(WarningKind::SkippedOperation).count(), 1);
    }
}
