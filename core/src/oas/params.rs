#![deny(missing_docs)]

//! # Parameter Resolution
//!
//! Logic for resolving OpenAPI parameter lists into [`Parameter`] records.
//! Handles `$ref`'d parameters, OAS 3.x `schema`/`content` forms, and legacy
//! Swagger 2.0 inline `type`/`format`/`items` declarations, including the
//! `body` and `formData` locations that later become a request body.

use crate::error::AppResult;
use crate::models::{ParamLocation, Parameter, SchemaNode, Warning, WarningKind};
use crate::oas::ref_utils::child_pointer;
use crate::oas::resolver::RefResolver;
use crate::oas::schemas::normalize_schema;
use serde_json::{Map, Value};

/// Header parameters OpenAPI says must be ignored; they are described by
/// the content negotiation and security objects instead.
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Keys of a Swagger 2.0 parameter that describe its value shape.
const LEGACY_SCHEMA_KEYS: [&str; 12] = [
    "type",
    "format",
    "items",
    "enum",
    "default",
    "example",
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
    "x-nullable",
];

/// A resolved parameter, before the Swagger 2.0 body/formData forms are
/// folded into a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedParam {
    /// Path, query, header or cookie parameter.
    Plain(Parameter),
    /// Swagger 2.0 `in: body`.
    Body {
        /// Body schema.
        schema: SchemaNode,
        /// Whether the body is mandatory.
        required: bool,
        /// Parameter description.
        description: Option<String>,
    },
    /// Swagger 2.0 `in: formData` field.
    FormField(Parameter),
}

impl ResolvedParam {
    fn key(&self) -> (String, &'static str) {
        match self {
            ResolvedParam::Plain(p) => (p.name.clone(), location_key(p.location)),
            ResolvedParam::Body { .. } => (String::new(), "body"),
            ResolvedParam::FormField(p) => (p.name.clone(), "formData"),
        }
    }
}

fn location_key(location: ParamLocation) -> &'static str {
    match location {
        ParamLocation::Path => "path",
        ParamLocation::Query => "query",
        ParamLocation::Header => "header",
        ParamLocation::Cookie => "cookie",
    }
}

/// Resolves one `parameters` array.
///
/// `pointer` is the location of the array itself and is used for warnings.
/// Entries with an unusable shape or location are skipped with a warning.
pub fn resolve_parameters(
    list: Option<&Value>,
    pointer: &str,
    resolver: &mut RefResolver<'_>,
) -> AppResult<Vec<ResolvedParam>> {
    let Some(Value::Array(entries)) = list else {
        return Ok(Vec::new());
    };

    let mut result: Vec<ResolvedParam> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry_pointer = child_pointer(pointer, &index.to_string());
        let Some(target) = resolver.deref(entry)? else {
            continue;
        };
        let Value::Object(param) = target else {
            resolver.warn(
                Warning::new(WarningKind::SkippedParameter, "parameter is not an object")
                    .at(&entry_pointer),
            );
            continue;
        };

        let name = param.get("name").and_then(Value::as_str);
        let location = param.get("in").and_then(Value::as_str);
        let (Some(name), Some(location)) = (name, location) else {
            resolver.warn(
                Warning::new(
                    WarningKind::SkippedParameter,
                    "parameter is missing `name` or `in`",
                )
                .at(&entry_pointer),
            );
            continue;
        };

        if location.eq_ignore_ascii_case("header")
            && RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str())
        {
            continue;
        }

        let Some(resolved) = process_parameter(name, location, param, &entry_pointer, resolver)?
        else {
            continue;
        };

        // Duplicates within one list: the later declaration wins.
        let key = resolved.key();
        match result.iter().position(|existing| existing.key() == key) {
            Some(i) => result[i] = resolved,
            None => result.push(resolved),
        }
    }
    Ok(result)
}

fn process_parameter(
    name: &str,
    location: &str,
    param: &Map<String, Value>,
    pointer: &str,
    resolver: &mut RefResolver<'_>,
) -> AppResult<Option<ResolvedParam>> {
    let description = param
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let declared_required = param
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if location == "body" {
        let schema = match param.get("schema") {
            Some(schema) => normalize_schema(schema, resolver)?,
            None => SchemaNode::any(),
        };
        return Ok(Some(ResolvedParam::Body {
            schema,
            required: declared_required,
            description,
        }));
    }

    let schema = parameter_schema(param, resolver)?;

    if location == "formData" {
        return Ok(Some(ResolvedParam::FormField(Parameter {
            name: name.to_string(),
            location: ParamLocation::Query,
            required: declared_required,
            schema,
            description,
        })));
    }

    let Some(location) = ParamLocation::parse(location) else {
        resolver.warn(
            Warning::new(
                WarningKind::SkippedParameter,
                format!("parameter `{}` has unsupported location `{}`", name, location),
            )
            .at(pointer),
        );
        return Ok(None);
    };

    Ok(Some(ResolvedParam::Plain(Parameter {
        name: name.to_string(),
        location,
        // Path parameters are always required.
        required: location == ParamLocation::Path || declared_required,
        schema,
        description,
    })))
}

/// Picks the parameter's shape from `schema`, `content`, or legacy inline keys.
fn parameter_schema(
    param: &Map<String, Value>,
    resolver: &mut RefResolver<'_>,
) -> AppResult<SchemaNode> {
    if let Some(schema) = param.get("schema") {
        return normalize_schema(schema, resolver);
    }

    if let Some(Value::Object(content)) = param.get("content") {
        return match content.values().find_map(|media| media.get("schema")) {
            Some(schema) => normalize_schema(schema, resolver),
            None => Ok(SchemaNode::any()),
        };
    }

    let legacy: Map<String, Value> = param
        .iter()
        .filter(|(k, _)| LEGACY_SCHEMA_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if legacy.is_empty() {
        return Ok(SchemaNode::any());
    }
    normalize_schema(&Value::Object(legacy), resolver)
}

/// Merges path-item and operation parameters.
///
/// Operation-level declarations come first and override path-level ones that
/// share the same name and location.
pub fn merge_parameters(
    path_level: Vec<ResolvedParam>,
    operation_level: Vec<ResolvedParam>,
) -> Vec<ResolvedParam> {
    let mut merged = operation_level;
    for inherited in path_level {
        let key = inherited.key();
        if !merged.iter().any(|p| p.key() == key) {
            merged.push(inherited);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CyclePolicy;
    use crate::models::PrimitiveKind;
    use serde_json::json;

    fn resolve(doc: &Value, list: Value) -> (Vec<ResolvedParam>, Vec<Warning>) {
        let mut resolver = RefResolver::new(doc, CyclePolicy::Placeholder);
        let params = resolve_parameters(Some(&list), "#/paths/~1x/get/parameters", &mut resolver)
            .unwrap();
        (params, resolver.take_warnings())
    }

    fn plain(param: &ResolvedParam) -> &Parameter {
        match param {
            ResolvedParam::Plain(p) => p,
            other => panic!("expected plain parameter, got {other:?}"),
        }
    }

    #[test]
    fn test_path_params_are_always_required() {
        let (params, _) = resolve(
            &json!({}),
            json!([{"name": "id", "in": "path", "schema": {"type": "integer"}}]),
        );
        let id = plain(&params[0]);
        assert!(id.required);
        assert_eq!(id.schema, SchemaNode::primitive(PrimitiveKind::Integer));
    }

    #[test]
    fn test_ref_parameter_is_followed() {
        let doc = json!({"components": {"parameters": {
            "Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}
        }}});
        let (params, _) = resolve(&doc, json!([{"$ref": "#/components/parameters/Limit"}]));
        assert_eq!(plain(&params[0]).name, "limit");
        assert_eq!(plain(&params[0]).location, ParamLocation::Query);
    }

    #[test]
    fn test_swagger_inline_type() {
        let (params, _) = resolve(
            &json!({}),
            json!([{"name": "tags", "in": "query", "type": "array", "items": {"type": "string"}, "required": true, "description": "filter"}]),
        );
        let tags = plain(&params[0]);
        assert!(tags.required);
        assert_eq!(tags.description.as_deref(), Some("filter"));
        assert!(matches!(tags.schema, SchemaNode::Array { .. }));
        assert!(tags.schema.meta().is_some_and(|m| m.description.is_none()));
    }

    #[test]
    fn test_body_and_form_data_are_kept_apart() {
        let (params, _) = resolve(
            &json!({}),
            json!([
                {"name": "payload", "in": "body", "required": true, "schema": {"type": "object"}},
                {"name": "file", "in": "formData", "type": "file"}
            ]),
        );
        assert!(matches!(params[0], ResolvedParam::Body { required: true, .. }));
        assert!(matches!(params[1], ResolvedParam::FormField(_)));
    }

    #[test]
    fn test_bad_entries_warn_and_reserved_headers_vanish() {
        let (params, warnings) = resolve(
            &json!({}),
            json!([
                {"in": "query"},
                {"name": "q", "in": "querystring"},
                {"name": "Accept", "in": "header"},
                {"name": "X-Trace", "in": "header"}
            ]),
        );
        assert_eq!(params.len(), 1);
        assert_eq!(plain(&params[0]).name, "X-Trace");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.kind == WarningKind::SkippedParameter));
        assert_eq!(
            warnings[0].location.as_deref(),
            Some("#/paths/~1x/get/parameters/0")
        );
    }

    #[test]
    fn test_operation_level_overrides_path_level() {
        let (path_level, _) = resolve(
            &json!({}),
            json!([
                {"name": "id", "in": "path", "description": "inherited"},
                {"name": "verbose", "in": "query"}
            ]),
        );
        let (op_level, _) = resolve(
            &json!({}),
            json!([{"name": "id", "in": "path", "description": "own"}]),
        );
        let merged = merge_parameters(path_level, op_level);
        assert_eq!(merged.len(), 2);
        assert_eq!(plain(&merged[0]).description.as_deref(), Some("own"));
        assert_eq!(plain(&merged[1]).name, "verbose");
    }
}
