//! # Request Bodies and Responses
//!
//! Resolves `requestBody` / `responses` (OAS 3.x) and the Swagger 2.0
//! equivalents (`in: body` / `in: formData` parameters, `consumes`,
//! `produces`, response-level `schema`).

use crate::error::AppResult;
use crate::models::{Parameter, RequestBody, ResponseSpec, SchemaMeta, SchemaNode};
use crate::oas::params::ResolvedParam;
use crate::oas::resolver::RefResolver;
use crate::oas::schemas::normalize_schema;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Chooses a media type: JSON first, then form, then multipart, else the first.
pub fn pick_media_type<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let all: Vec<&str> = candidates.into_iter().collect();
    let find = |test: fn(&str) -> bool| {
        all.iter()
            .copied()
            .find(|m| test(&m.to_ascii_lowercase()))
    };

    find(is_plain_json)
        .or_else(|| find(|m| m.contains("json")))
        .or_else(|| find(|m| m.starts_with(FORM_URLENCODED)))
        .or_else(|| find(|m| m.starts_with(MULTIPART)))
        .or_else(|| all.first().copied())
}

fn is_plain_json(media: &str) -> bool {
    media.split(';').next().unwrap_or(media).trim() == "application/json"
}

/// Resolves an OAS 3.x `requestBody`.
pub fn resolve_request_body(
    raw: Option<&Value>,
    resolver: &mut RefResolver<'_>,
) -> AppResult<Option<RequestBody>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let Some(body) = resolver.deref(raw)? else {
        return Ok(None);
    };

    let required = body
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let content = body.get("content").and_then(Value::as_object);

    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return Ok(Some(RequestBody {
            content_type: "application/json".into(),
            required,
            schema: None,
            raw: None,
        }));
    };

    let content_type = pick_media_type(content.keys().map(String::as_str))
        .unwrap_or("application/json")
        .to_string();
    let schema = match content.get(&content_type).and_then(|m| m.get("schema")) {
        Some(schema) => Some(normalize_schema(schema, resolver)?),
        None => None,
    };

    Ok(Some(RequestBody {
        content_type,
        required,
        schema,
        raw: None,
    }))
}

/// Folds Swagger 2.0 `body` / `formData` parameters into a request body.
///
/// Returns the remaining plain parameters alongside.
pub fn split_legacy_body(
    params: Vec<ResolvedParam>,
    consumes: &[String],
) -> (Vec<Parameter>, Option<RequestBody>) {
    let mut plain = Vec::new();
    let mut body = None;
    let mut form_fields = Vec::new();

    for param in params {
        match param {
            ResolvedParam::Plain(p) => plain.push(p),
            ResolvedParam::Body {
                schema, required, ..
            } => {
                let content_type = pick_media_type(consumes.iter().map(String::as_str))
                    .unwrap_or("application/json")
                    .to_string();
                body = Some(RequestBody {
                    content_type,
                    required,
                    schema: Some(schema),
                    raw: None,
                });
            }
            ResolvedParam::FormField(p) => form_fields.push(p),
        }
    }

    if body.is_none() && !form_fields.is_empty() {
        let has_file = form_fields.iter().any(|f| {
            matches!(&f.schema, SchemaNode::Primitive { format: Some(fmt), .. } if fmt == "binary")
        });
        let multipart_declared = consumes
            .iter()
            .any(|c| c.to_ascii_lowercase().starts_with(MULTIPART));
        let content_type = if has_file || multipart_declared {
            MULTIPART
        } else {
            FORM_URLENCODED
        };

        let required: BTreeSet<String> = form_fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect();
        let any_required = !required.is_empty();
        let fields = form_fields
            .into_iter()
            .map(|f| {
                let mut schema = f.schema;
                if let (Some(meta), Some(desc)) = (schema.meta_mut(), f.description) {
                    meta.description.get_or_insert(desc);
                }
                (f.name, schema)
            })
            .collect();

        body = Some(RequestBody {
            content_type: content_type.to_string(),
            required: any_required,
            schema: Some(SchemaNode::Object {
                fields,
                required,
                meta: SchemaMeta::default(),
            }),
            raw: None,
        });
    }

    (plain, body)
}

/// Resolves a `responses` map, keyed by status (`200`, `4XX`, `default`).
pub fn resolve_responses(
    raw: Option<&Value>,
    produces: &[String],
    resolver: &mut RefResolver<'_>,
) -> AppResult<IndexMap<String, ResponseSpec>> {
    let mut responses = IndexMap::new();
    let Some(Value::Object(entries)) = raw else {
        return Ok(responses);
    };

    for (status, entry) in entries {
        if status.starts_with("x-") {
            continue;
        }
        let Some(response) = resolver.deref(entry)? else {
            responses.insert(status.clone(), ResponseSpec::default());
            continue;
        };

        let description = response
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let (content_type, schema) = match response.get("content").and_then(Value::as_object) {
            Some(content) if !content.is_empty() => {
                let media = pick_media_type(content.keys().map(String::as_str));
                let schema = media
                    .and_then(|m| content.get(m))
                    .and_then(|m| m.get("schema"));
                let schema = match schema {
                    Some(s) => Some(normalize_schema(s, resolver)?),
                    None => None,
                };
                (media.map(str::to_string), schema)
            }
            // Swagger 2.0: schema sits on the response, media type in `produces`.
            _ => match response.get("schema") {
                Some(s) => (
                    Some(
                        pick_media_type(produces.iter().map(String::as_str))
                            .unwrap_or("application/json")
                            .to_string(),
                    ),
                    Some(normalize_schema(s, resolver)?),
                ),
                None => (None, None),
            },
        };

        responses.insert(
            status.clone(),
            ResponseSpec {
                description,
                content_type,
                schema,
            },
        );
    }
    Ok(responses)
}
