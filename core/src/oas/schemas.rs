//! # Schema Normalization
//!
//! Converts raw JSON-Schema fragments into [`SchemaNode`] trees.
//!
//! Inference order:
//! - explicit `type` wins (3.1 type arrays use the first non-null entry),
//! - `properties` implies an object,
//! - `items` implies an array,
//! - `enum` wraps whatever base was inferred,
//! - anything else is `any`.
//!
//! Unexpected shapes degrade to `any`; normalization only fails when a nested
//! `$ref` fails.

use crate::error::AppResult;
use crate::models::{PrimitiveKind, SchemaMeta, SchemaNode};
use crate::oas::resolver::RefResolver;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Normalizes one schema fragment, resolving nested `$ref`s through `resolver`.
pub fn normalize_schema(fragment: &Value, resolver: &mut RefResolver<'_>) -> AppResult<SchemaNode> {
    let Value::Object(map) = fragment else {
        // Boolean schemas (`true` / `false`) and garbage carry no shape.
        return Ok(SchemaNode::any());
    };

    let meta = read_meta(map);

    if let Some(raw) = map.get("$ref").and_then(Value::as_str) {
        let mut node = resolver.resolve(raw)?;
        overlay_meta(&mut node, &meta);
        return Ok(node);
    }

    if let Some(Value::Array(members)) = map.get("allOf") {
        let mut node = merge_all_of(members, map, resolver)?;
        overlay_meta(&mut node, &meta);
        return Ok(node);
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(Value::Array(members)) = map.get(key) {
            let mut node = collapse_alternatives(members, resolver)?;
            overlay_meta(&mut node, &meta);
            return Ok(node);
        }
    }

    let (type_name, nullable_from_type) = declared_type(map);
    let mut meta = meta;
    meta.nullable |= nullable_from_type;
    let format = map
        .get("format")
        .and_then(Value::as_str)
        .map(str::to_string);

    let base = match type_name.as_deref() {
        Some("object") => build_object(map, meta.clone(), resolver)?,
        Some("array") => build_array(map, meta.clone(), resolver)?,
        // Swagger 2.0 upload parameters.
        Some("file") => SchemaNode::Primitive {
            primitive: PrimitiveKind::String,
            format: Some("binary".into()),
            meta: meta.clone(),
        },
        Some(name) => match PrimitiveKind::from_type_name(name) {
            Some(primitive) => SchemaNode::Primitive {
                primitive,
                format,
                meta: meta.clone(),
            },
            None => SchemaNode::Primitive {
                primitive: PrimitiveKind::Any,
                format,
                meta: meta.clone(),
            },
        },
        None if map.contains_key("properties") => build_object(map, meta.clone(), resolver)?,
        None if map.contains_key("items") => build_array(map, meta.clone(), resolver)?,
        None => SchemaNode::Primitive {
            primitive: PrimitiveKind::Any,
            format,
            meta: meta.clone(),
        },
    };

    match map.get("enum") {
        Some(Value::Array(values)) => {
            let base = if type_name.is_none() {
                strip_meta(enum_base(values))
            } else {
                strip_meta(base)
            };
            Ok(SchemaNode::Enum {
                base: Box::new(base),
                values: values.clone(),
                meta,
            })
        }
        _ => Ok(base),
    }
}

/// Infers a schema from a concrete JSON instance (e.g. a request body).
///
/// Every present key is required, and scalar fields carry their observed
/// value as `example`.
pub fn infer_from_value(value: &Value) -> SchemaNode {
    match value {
        Value::Object(map) => {
            let fields: IndexMap<String, SchemaNode> = map
                .iter()
                .map(|(k, v)| (k.clone(), infer_from_value(v)))
                .collect();
            let required = fields.keys().cloned().collect();
            SchemaNode::Object {
                fields,
                required,
                meta: SchemaMeta::default(),
            }
        }
        Value::Array(items) => SchemaNode::Array {
            items: Box::new(
                items
                    .first()
                    .map(infer_from_value)
                    .unwrap_or_else(SchemaNode::any),
            ),
            meta: SchemaMeta::default(),
        },
        scalar => SchemaNode::Primitive {
            primitive: scalar_kind(scalar),
            format: None,
            meta: SchemaMeta {
                example: (!scalar.is_null()).then(|| scalar.clone()),
                ..SchemaMeta::default()
            },
        },
    }
}

fn scalar_kind(value: &Value) -> PrimitiveKind {
    match value {
        Value::String(_) => PrimitiveKind::String,
        Value::Bool(_) => PrimitiveKind::Boolean,
        Value::Number(n) if n.is_f64() => PrimitiveKind::Number,
        Value::Number(_) => PrimitiveKind::Integer,
        Value::Null => PrimitiveKind::Null,
        _ => PrimitiveKind::Any,
    }
}

/// Returns the effective `type` and whether a `null` entry made it nullable.
fn declared_type(map: &Map<String, Value>) -> (Option<String>, bool) {
    match map.get("type") {
        Some(Value::String(t)) => (Some(t.clone()), false),
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let first = names
                .iter()
                .find(|t| **t != "null")
                .or_else(|| names.first())
                .map(|t| t.to_string());
            (first, nullable && names.len() > 1)
        }
        _ => (None, false),
    }
}

fn build_object(
    map: &Map<String, Value>,
    meta: SchemaMeta,
    resolver: &mut RefResolver<'_>,
) -> AppResult<SchemaNode> {
    let mut fields = IndexMap::new();
    if let Some(Value::Object(props)) = map.get("properties") {
        for (name, prop) in props {
            fields.insert(name.clone(), normalize_schema(prop, resolver)?);
        }
    }
    Ok(SchemaNode::Object {
        fields,
        required: read_required(map),
        meta,
    })
}

fn build_array(
    map: &Map<String, Value>,
    meta: SchemaMeta,
    resolver: &mut RefResolver<'_>,
) -> AppResult<SchemaNode> {
    let items = match map.get("items") {
        Some(items @ Value::Object(_)) => normalize_schema(items, resolver)?,
        // Tuple form: take the first positional schema.
        Some(Value::Array(tuple)) => match tuple.first() {
            Some(first) => normalize_schema(first, resolver)?,
            None => SchemaNode::any(),
        },
        _ => SchemaNode::any(),
    };
    Ok(SchemaNode::Array {
        items: Box::new(items),
        meta,
    })
}

fn read_required(map: &Map<String, Value>) -> BTreeSet<String> {
    match map.get("required") {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

fn enum_base(values: &[Value]) -> SchemaNode {
    let mut kinds = values
        .iter()
        .filter(|v| !v.is_null())
        .map(scalar_kind);
    match kinds.next() {
        Some(first) if kinds.all(|k| k == first) => SchemaNode::primitive(first),
        _ => SchemaNode::any(),
    }
}

fn strip_meta(mut node: SchemaNode) -> SchemaNode {
    if let Some(meta) = node.meta_mut() {
        *meta = SchemaMeta::default();
    }
    node
}

/// Flattens `allOf` composition into a single object.
///
/// Non-object members contribute nothing unless they are the only member.
fn merge_all_of(
    members: &[Value],
    owner: &Map<String, Value>,
    resolver: &mut RefResolver<'_>,
) -> AppResult<SchemaNode> {
    let mut normalized = Vec::with_capacity(members.len());
    for member in members {
        normalized.push(normalize_schema(member, resolver)?);
    }

    if owner.contains_key("properties") {
        let own = build_object(owner, SchemaMeta::default(), resolver)?;
        normalized.push(own);
    }

    let objects = normalized
        .iter()
        .filter(|n| matches!(n, SchemaNode::Object { .. }))
        .count();
    if objects == 0 {
        return Ok(match normalized.len() {
            1 => normalized.remove(0),
            _ => SchemaNode::any(),
        });
    }

    let mut merged_fields = IndexMap::new();
    let mut merged_required = BTreeSet::new();
    let mut merged_meta = SchemaMeta::default();
    for node in normalized {
        if let SchemaNode::Object {
            fields,
            required,
            meta,
        } = node
        {
            merged_fields.extend(fields);
            merged_required.extend(required);
            if merged_meta.is_empty() {
                merged_meta = meta;
            }
        }
    }
    merged_required.extend(read_required(owner));

    Ok(SchemaNode::Object {
        fields: merged_fields,
        required: merged_required,
        meta: merged_meta,
    })
}

/// `oneOf` / `anyOf`: a single non-null member collapses to that member.
fn collapse_alternatives(
    members: &[Value],
    resolver: &mut RefResolver<'_>,
) -> AppResult<SchemaNode> {
    let mut candidates = Vec::new();
    let mut saw_null = false;
    for member in members {
        let node = normalize_schema(member, resolver)?;
        if matches!(
            node,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::Null,
                ..
            }
        ) {
            saw_null = true;
        } else {
            candidates.push(node);
        }
    }

    if candidates.len() == 1 {
        let mut node = candidates.remove(0);
        if saw_null {
            if let Some(meta) = node.meta_mut() {
                meta.nullable = true;
            }
        }
        return Ok(node);
    }

    let mut any = SchemaNode::any();
    if saw_null {
        if let Some(meta) = any.meta_mut() {
            meta.nullable = true;
        }
    }
    Ok(any)
}

fn read_meta(map: &Map<String, Value>) -> SchemaMeta {
    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    let uint = |key: &str| map.get(key).and_then(Value::as_u64);
    let float = |key: &str| map.get(key).and_then(Value::as_f64);

    let example = map.get("example").cloned().or_else(|| {
        map.get("examples")
            .and_then(Value::as_array)
            .and_then(|list| list.first().cloned())
    });

    SchemaMeta {
        title: text("title"),
        description: text("description"),
        example,
        default: map.get("default").cloned(),
        nullable: map
            .get("nullable")
            .or_else(|| map.get("x-nullable"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        min_length: uint("minLength"),
        max_length: uint("maxLength"),
        minimum: float("minimum"),
        maximum: float("maximum"),
        pattern: text("pattern"),
    }
}

/// Applies annotations written next to a `$ref` or composition keyword.
fn overlay_meta(node: &mut SchemaNode, overlay: &SchemaMeta) {
    if overlay.is_empty() {
        return;
    }
    let Some(meta) = node.meta_mut() else {
        return;
    };
    macro_rules! take {
        ($($field:ident),*) => {
            $(if overlay.$field.is_some() {
                meta.$field = overlay.$field.clone();
            })*
        };
    }
    take!(title, description, example, default, min_length, max_length, minimum, maximum, pattern);
    meta.nullable |= overlay.nullable;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CyclePolicy;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn normalize(fragment: Value) -> SchemaNode {
        let mut resolver = RefResolver::detached();
        normalize_schema(&fragment, &mut resolver).unwrap()
    }

    #[test]
    fn test_object_with_required_field() {
        let node = normalize(json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "required": ["a"]
        }));
        match &node {
            SchemaNode::Object { fields, required, .. } => {
                assert_eq!(fields.get("a"), Some(&SchemaNode::string()));
                assert!(required.contains("a"));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_inference_without_explicit_type() {
        assert!(matches!(
            normalize(json!({"properties": {}})),
            SchemaNode::Object { .. }
        ));
        assert!(matches!(
            normalize(json!({"items": {"type": "integer"}})),
            SchemaNode::Array { .. }
        ));
        assert!(normalize(json!({"description": "whatever"})).is_any());
        assert!(normalize(json!(true)).is_any());
    }

    #[test]
    fn test_explicit_type_beats_properties() {
        let node = normalize(json!({"type": "string", "properties": {"x": {}}}));
        assert_eq!(node, SchemaNode::string());
    }

    #[test]
    fn test_enum_wraps_base_type() {
        let node = normalize(json!({"type": "string", "enum": ["a", "b"], "description": "state"}));
        assert_eq!(
            node,
            SchemaNode::Enum {
                base: Box::new(SchemaNode::string()),
                values: vec![json!("a"), json!("b")],
                meta: SchemaMeta {
                    description: Some("state".into()),
                    ..SchemaMeta::default()
                },
            }
        );

        let untyped = normalize(json!({"enum": [1, 2, 3]}));
        match untyped {
            SchemaNode::Enum { base, .. } => {
                assert_eq!(*base, SchemaNode::primitive(PrimitiveKind::Integer))
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn test_type_array_sets_nullable() {
        let node = normalize(json!({"type": ["string", "null"], "maxLength": 8}));
        assert_eq!(
            node,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::String,
                format: None,
                meta: SchemaMeta {
                    nullable: true,
                    max_length: Some(8),
                    ..SchemaMeta::default()
                },
            }
        );
    }

    #[test]
    fn test_all_of_merges_objects() {
        let doc = json!({"components": {"schemas": {
            "Base": {"type": "object", "properties": {"id": {"type": "integer"}}, "required": ["id"]}
        }}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = normalize_schema(
            &json!({"allOf": [
                {"$ref": "#/components/schemas/Base"},
                {"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}
            ]}),
            &mut resolver,
        )
        .unwrap();
        match node {
            SchemaNode::Object { fields, required, .. } => {
                assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["id", "name"]);
                assert_eq!(required.len(), 2);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_one_of_with_null_collapses() {
        let node = normalize(json!({"oneOf": [{"type": "null"}, {"type": "integer"}]}));
        assert_eq!(
            node.meta().map(|m| m.nullable),
            Some(true)
        );
        assert!(matches!(
            node,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::Integer,
                ..
            }
        ));
        assert!(normalize(json!({"anyOf": [{"type": "integer"}, {"type": "string"}]})).is_any());
    }

    #[test]
    fn test_ref_siblings_override_description() {
        let doc = json!({"components": {"schemas": {"Id": {"type": "string", "description": "base"}}}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = normalize_schema(
            &json!({"$ref": "#/components/schemas/Id", "description": "owner id"}),
            &mut resolver,
        )
        .unwrap();
        assert_eq!(
            node.meta().and_then(|m| m.description.as_deref()),
            Some("owner id")
        );
    }

    #[test]
    fn test_swagger_file_type() {
        let node = normalize(json!({"type": "file"}));
        assert!(matches!(
            node,
            SchemaNode::Primitive { primitive: PrimitiveKind::String, format: Some(ref f), .. } if f == "binary"
        ));
    }

    #[test]
    fn test_infer_from_value_requires_every_key() {
        let node = infer_from_value(&json!({"name": "a", "age": 3, "tags": ["x"], "score": 1.5}));
        match node {
            SchemaNode::Object { fields, required, .. } => {
                assert_eq!(required.len(), 4);
                assert_eq!(
                    fields["name"],
                    SchemaNode::Primitive {
                        primitive: PrimitiveKind::String,
                        format: None,
                        meta: SchemaMeta {
                            example: Some(json!("a")),
                            ..SchemaMeta::default()
                        },
                    }
                );
                assert!(matches!(
                    fields["age"],
                    SchemaNode::Primitive { primitive: PrimitiveKind::Integer, .. }
                ));
                assert!(matches!(
                    fields["score"],
                    SchemaNode::Primitive { primitive: PrimitiveKind::Number, .. }
                ));
                assert!(matches!(fields["tags"], SchemaNode::Array { .. }));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }
}
