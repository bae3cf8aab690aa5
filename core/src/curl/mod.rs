//! # cURL Extractor
//!
//! Turns one pasted `curl` command into exactly one [`EndpointRecord`].
//!
//! - **tokenizer**: shell word splitting.
//! - **flags**: flag interpretation into a [`CurlCommand`].
//!
//! The base URL keeps scheme, authority and a leading `v<digits>` version
//! segment; everything after it becomes the path template.

pub mod flags;
pub mod tokenizer;

use crate::error::{AppError, AppResult};
use crate::models::{
    AuthRequirement, EndpointRecord, ExtractionResult, ExtractorKind, HttpMethod, ParamLocation,
    Parameter, PrimitiveKind, ProjectContext, ProjectMetadata, Provenance, RequestBody, SchemaMeta,
    SchemaNode, SourceLocation, Warning, WarningKind,
};
use crate::oas::naming::derive_handler_name;
use crate::oas::schemas::infer_from_value;
use crate::scanner::paths::{normalize_template, PathParam};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::Url;

pub use flags::{CurlCommand, DataArg};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Headers described elsewhere in the record (body content type, auth) or
/// set by the transport.
const TRANSPORT_HEADERS: &[&str] = &[
    "accept",
    "content-type",
    "content-length",
    "authorization",
    "cookie",
    "host",
    "user-agent",
    "connection",
    "accept-encoding",
];

const API_KEY_HEADERS: &[&str] = &[
    "x-api-key",
    "api-key",
    "apikey",
    "x-apikey",
    "x-auth-token",
    "x-access-token",
];

const API_KEY_QUERY: &[&str] = &["api_key", "apikey", "api-key"];

const MAX_SNIPPET: usize = 200;

fn version_segment() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^v\d+$").expect("Invalid regex constant"))
}

/// Extracts the endpoint described by a curl command.
///
/// Fails with `MalformedCommand` on an unterminated quote, a command that is
/// not `curl`, or a missing or unparsable URL.
pub fn extract_curl(command: &str) -> AppResult<ExtractionResult> {
    let tokens = tokenizer::tokenize(command)?;
    let (cmd, flag_warnings) = flags::parse_tokens(&tokens)?;

    let mut result = ExtractionResult::new();
    result.extend_warnings(flag_warnings);

    let raw_url = cmd.url.as_deref().unwrap_or_default();
    let url = parse_url(raw_url)?;
    let (base_url, raw_path) = split_base(&url);
    let (path, path_params) = normalize_template(&raw_path);

    let method = resolve_method(&cmd, &mut result);
    let send_data_in_query = cmd.get && !cmd.data.is_empty();

    let mut parameters: Vec<Parameter> =
        path_params.iter().map(PathParam::to_parameter).collect();
    let mut auth = AuthRequirement::None;

    let mut query_pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if send_data_in_query {
        for data in &cmd.data {
            query_pairs.extend(
                url::form_urlencoded::parse(data.text().as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned())),
            );
        }
    }
    for (name, value) in query_pairs {
        if API_KEY_QUERY.contains(&name.to_ascii_lowercase().as_str()) {
            if !auth.is_required() {
                auth = AuthRequirement::ApiKey {
                    name,
                    location: ParamLocation::Query,
                };
            }
            continue;
        }
        parameters.push(example_param(name, ParamLocation::Query, value));
    }

    for (name, value) in &cmd.headers {
        let lower = name.to_ascii_lowercase();
        if API_KEY_HEADERS.contains(&lower.as_str()) {
            auth = AuthRequirement::ApiKey {
                name: name.clone(),
                location: ParamLocation::Header,
            };
            continue;
        }
        if TRANSPORT_HEADERS.contains(&lower.as_str()) {
            if lower == "cookie" {
                for pair in value.split(';') {
                    if let Some((k, v)) = pair.split_once('=') {
                        parameters.push(example_param(
                            k.trim().to_string(),
                            ParamLocation::Cookie,
                            v.trim().to_string(),
                        ));
                    }
                }
            }
            continue;
        }
        parameters.push(example_param(
            name.clone(),
            ParamLocation::Header,
            value.clone(),
        ));
    }
    for (name, value) in &cmd.cookies {
        parameters.push(example_param(
            name.clone(),
            ParamLocation::Cookie,
            value.clone(),
        ));
    }

    if let Some(from_authorization) = cmd.header("authorization").map(authorization_scheme) {
        auth = from_authorization;
    }
    if cmd.user.is_some() {
        auth = AuthRequirement::Basic;
    }
    if cmd.bearer.is_some() {
        auth = AuthRequirement::Bearer { format: None };
    }

    let request_body = if send_data_in_query {
        None
    } else {
        build_body(&cmd, &mut result)
    };

    let mut ctx = ProjectContext::with_metadata(ProjectMetadata {
        title: None,
        version: None,
        base_url: Some(base_url),
    });
    let operation_id = ctx.unique_operation_id(&derive_handler_name(method.as_lower(), &path));

    let mut record = EndpointRecord::new(
        method,
        path,
        operation_id,
        Provenance {
            extractor: ExtractorKind::Curl,
            location: SourceLocation::Command,
            snippet: Some(snippet(command)),
        },
    );
    record.parameters = parameters;
    record.request_body = request_body;
    record.auth = auth;

    tracing::debug!(method = %record.method, path = %record.path, "curl command parsed");
    result.project = ctx.metadata;
    result.push_endpoint(record);
    Ok(result)
}

fn parse_url(raw: &str) -> AppResult<Url> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        // curl's default scheme.
        format!("http://{}", raw)
    };
    Url::parse(&with_scheme)
        .map_err(|e| AppError::MalformedCommand(format!("invalid URL `{}`: {}", raw, e)))
}

/// Splits `https://h/v1/users` into (`https://h/v1`, `/users`).
///
/// Path segments come back percent-decoded so `{id}` survives as written.
fn split_base(url: &Url) -> (String, String) {
    let mut base = url.origin().ascii_serialization();
    let segments: Vec<String> = url
        .path_segments()
        .map(|s| {
            s.filter(|seg| !seg.is_empty())
                .map(|seg| percent_decode_str(seg).decode_utf8_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let rest = match segments.split_first() {
        Some((first, rest)) if version_segment().is_match(first) => {
            base.push('/');
            base.push_str(first);
            rest
        }
        _ => &segments[..],
    };

    (base, format!("/{}", rest.join("/")))
}

fn resolve_method(cmd: &CurlCommand, result: &mut ExtractionResult) -> HttpMethod {
    if let Some(raw) = &cmd.method {
        match HttpMethod::parse(raw) {
            Some(method) => return method,
            None => result.warn(
                Warning::new(
                    WarningKind::IgnoredCurlFlag,
                    format!("unsupported method {}", raw),
                )
                .at("-X"),
            ),
        }
    }
    if cmd.head {
        HttpMethod::Head
    } else if cmd.get {
        HttpMethod::Get
    } else if !cmd.data.is_empty() || !cmd.form.is_empty() {
        HttpMethod::Post
    } else {
        HttpMethod::Get
    }
}

fn authorization_scheme(value: &str) -> AuthRequirement {
    let scheme = value.split_whitespace().next().unwrap_or("");
    match scheme.to_ascii_lowercase().as_str() {
        "bearer" => AuthRequirement::Bearer { format: None },
        "basic" => AuthRequirement::Basic,
        // `Token abc`, raw keys and the like.
        _ => AuthRequirement::ApiKey {
            name: "Authorization".into(),
            location: ParamLocation::Header,
        },
    }
}

fn example_param(name: String, location: ParamLocation, example: String) -> Parameter {
    Parameter {
        name,
        location,
        required: location != ParamLocation::Query,
        schema: SchemaNode::Primitive {
            primitive: PrimitiveKind::String,
            format: None,
            meta: SchemaMeta {
                example: Some(Value::String(example)),
                ..SchemaMeta::default()
            },
        },
        description: None,
    }
}

fn build_body(cmd: &CurlCommand, result: &mut ExtractionResult) -> Option<RequestBody> {
    if !cmd.form.is_empty() {
        let fields = cmd
            .form
            .iter()
            .map(|(name, value)| {
                let schema = match value.strip_prefix('@') {
                    Some(_) => SchemaNode::Primitive {
                        primitive: PrimitiveKind::String,
                        format: Some("binary".into()),
                        meta: titled(name),
                    },
                    None => string_field(name, value),
                };
                (name.clone(), schema)
            })
            .collect();
        return Some(RequestBody {
            content_type: "multipart/form-data".into(),
            required: true,
            schema: Some(all_required(fields)),
            raw: None,
        });
    }

    let last = cmd.data.last()?;
    let declared = cmd.header("content-type").map(str::to_string);

    if let Some(DataArg::File(path)) = cmd.data.iter().find(|d| matches!(d, DataArg::File(_))) {
        result.warn(
            Warning::new(
                WarningKind::OpaqueBody,
                format!("request body is read from file {}", path),
            )
            .at("-d"),
        );
        return Some(RequestBody {
            content_type: declared.unwrap_or_else(|| FORM_URLENCODED.into()),
            required: true,
            schema: None,
            raw: Some(last.text().to_string()),
        });
    }

    let looks_like_json = |s: &str| matches!(s.trim_start().chars().next(), Some('{' | '['));
    let content_type = declared.clone().unwrap_or_else(|| {
        if cmd.json || looks_like_json(last.text()) {
            "application/json".into()
        } else {
            FORM_URLENCODED.into()
        }
    });
    let lower = content_type.to_ascii_lowercase();

    if lower.contains("json") {
        // Raw JSON: the last data flag wins.
        let payload = last.text().to_string();
        let schema = match serde_json::from_str::<Value>(&payload) {
            Ok(value) => Some(title_fields(infer_from_value(&value))),
            Err(err) => {
                result.warn(
                    Warning::new(
                        WarningKind::OpaqueBody,
                        format!("request body is not valid JSON: {}", err),
                    )
                    .at("-d"),
                );
                None
            }
        };
        return Some(RequestBody {
            content_type,
            required: true,
            schema,
            raw: Some(payload),
        });
    }

    let joined = cmd
        .data
        .iter()
        .map(DataArg::text)
        .collect::<Vec<_>>()
        .join("&");

    if lower.starts_with(FORM_URLENCODED) {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(joined.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let well_formed = !pairs.is_empty()
            && pairs.iter().all(|(k, _)| !k.is_empty())
            && joined.split('&').all(|part| part.contains('='));
        if well_formed {
            let fields = pairs
                .iter()
                .map(|(k, v)| (k.clone(), string_field(k, v)))
                .collect();
            return Some(RequestBody {
                content_type,
                required: true,
                schema: Some(all_required(fields)),
                raw: Some(joined),
            });
        }
    }

    result.warn(
        Warning::new(
            WarningKind::OpaqueBody,
            format!("request body of type {} kept as text", content_type),
        )
        .at("-d"),
    );
    Some(RequestBody {
        content_type,
        required: true,
        schema: None,
        raw: Some(joined),
    })
}

fn titled(name: &str) -> SchemaMeta {
    SchemaMeta {
        title: Some(capitalize(name)),
        ..SchemaMeta::default()
    }
}

fn string_field(name: &str, example: &str) -> SchemaNode {
    SchemaNode::Primitive {
        primitive: PrimitiveKind::String,
        format: None,
        meta: SchemaMeta {
            example: Some(Value::String(example.to_string())),
            ..titled(name)
        },
    }
}

fn all_required(fields: IndexMap<String, SchemaNode>) -> SchemaNode {
    let required: BTreeSet<String> = fields.keys().cloned().collect();
    SchemaNode::Object {
        fields,
        required,
        meta: SchemaMeta::default(),
    }
}

/// Gives each top-level field of an inferred object a title.
fn title_fields(mut node: SchemaNode) -> SchemaNode {
    if let SchemaNode::Object { fields, .. } = &mut node {
        for (name, field) in fields.iter_mut() {
            if let Some(meta) = field.meta_mut() {
                meta.title.get_or_insert_with(|| capitalize(name));
            }
        }
    }
    node
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn snippet(command: &str) -> String {
    let flat = command
        .replace("\\\r\n", " ")
        .replace("\\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match flat.char_indices().nth(MAX_SNIPPET) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(command: &str) -> (EndpointRecord, ExtractionResult) {
        let result = extract_curl(command).unwrap();
        assert_eq!(result.endpoints.len(), 1);
        (result.endpoints[0].clone(), result)
    }

    #[test]
    fn test_json_post() {
        let (record, result) = single(
            r#"curl -X POST https://api.x.com/users -H "Content-Type: application/json" -d '{"name":"a"}'"#,
        );
        assert_eq!(record.method, HttpMethod::Post);
        assert_eq!(record.path, "/users");
        assert_eq!(result.project.base_url.as_deref(), Some("https://api.x.com"));
        let body = record.request_body.unwrap();
        assert_eq!(body.content_type, "application/json");
        let name = body.schema.as_ref().and_then(|s| s.field("name")).unwrap();
        assert!(matches!(
            name,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::String,
                ..
            }
        ));
        assert_eq!(
            name.meta().and_then(|m| m.title.as_deref()),
            Some("Name")
        );
        assert!(record.parameters.is_empty());
    }

    #[test]
    fn test_plain_get() {
        let (record, result) = single("curl https://api.x.com/items");
        assert_eq!(record.method, HttpMethod::Get);
        assert_eq!(record.path, "/items");
        assert!(record.request_body.is_none());
        assert!(result.warnings.is_empty());
        assert_eq!(record.operation_id, "get_items");
    }

    #[test]
    fn test_version_prefix_moves_to_base_url() {
        let (record, result) = single("curl 'https://api.x.com/v2/users/42?expand=true'");
        assert_eq!(record.path, "/users/42");
        assert_eq!(
            result.project.base_url.as_deref(),
            Some("https://api.x.com/v2")
        );
        let expand = record.parameter("expand", ParamLocation::Query).unwrap();
        assert!(!expand.required);
        assert_eq!(
            expand.schema.meta().and_then(|m| m.example.clone()),
            Some(Value::String("true".into()))
        );
    }

    #[test]
    fn test_form_body_concatenates_data_flags() {
        let (record, _) = single("curl https://x.io/login -d username=bob -d 'password=s3cr%21t'");
        assert_eq!(record.method, HttpMethod::Post);
        let body = record.request_body.unwrap();
        assert_eq!(body.content_type, FORM_URLENCODED);
        assert_eq!(body.raw.as_deref(), Some("username=bob&password=s3cr%21t"));
        match body.schema.unwrap() {
            SchemaNode::Object {
                fields, required, ..
            } => {
                assert_eq!(required.len(), 2);
                assert_eq!(
                    fields["password"].meta().and_then(|m| m.example.clone()),
                    Some(Value::String("s3cr!t".into()))
                );
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_last_json_data_wins() {
        let (record, _) = single(r#"curl https://x.io/a -d '{"a":1}' -d '{"b":true}'"#);
        let schema = record.request_body.unwrap().schema.unwrap();
        assert!(schema.field("a").is_none());
        assert!(schema.field("b").is_some());
    }

    #[test]
    fn test_opaque_bodies_warn() {
        let (record, result) =
            single("curl https://x.io/a -H 'Content-Type: text/plain' -d 'hello world'");
        let body = record.request_body.unwrap();
        assert!(body.schema.is_none());
        assert_eq!(body.raw.as_deref(), Some("hello world"));
        assert_eq!(result.warnings_of(WarningKind::OpaqueBody).count(), 1);

        let (_, result) = single("curl https://x.io/a --json '{broken'");
        assert_eq!(result.warnings_of(WarningKind::OpaqueBody).count(), 1);
    }

    #[test]
    fn test_auth_detection() {
        let (record, _) = single("curl https://x.io/me -H 'Authorization: Bearer abc'");
        assert_eq!(record.auth, AuthRequirement::Bearer { format: None });
        assert!(record.parameters.is_empty());

        let (record, _) = single("curl -u alice:pw https://x.io/me");
        assert_eq!(record.auth, AuthRequirement::Basic);

        let (record, _) = single("curl https://x.io/me -H 'X-API-Key: k'");
        assert_eq!(
            record.auth,
            AuthRequirement::ApiKey {
                name: "X-API-Key".into(),
                location: ParamLocation::Header
            }
        );

        let (record, _) = single("curl 'https://x.io/me?api_key=k&page=2'");
        assert_eq!(
            record.auth,
            AuthRequirement::ApiKey {
                name: "api_key".into(),
                location: ParamLocation::Query
            }
        );
        assert_eq!(record.parameters.len(), 1);
    }

    #[test]
    fn test_get_flag_moves_data_to_query() {
        let (record, _) = single("curl -G https://x.io/search -d q=rust -d limit=5");
        assert_eq!(record.method, HttpMethod::Get);
        assert!(record.request_body.is_none());
        assert!(record.parameter("q", ParamLocation::Query).is_some());
        assert!(record.parameter("limit", ParamLocation::Query).is_some());
    }

    #[test]
    fn test_head_and_multipart() {
        let (record, _) = single("curl -I https://x.io/health");
        assert_eq!(record.method, HttpMethod::Head);

        let (record, _) = single("curl https://x.io/upload -F file=@cat.png -F caption=hi");
        assert_eq!(record.method, HttpMethod::Post);
        let body = record.request_body.unwrap();
        assert_eq!(body.content_type, "multipart/form-data");
        let file = body.schema.as_ref().and_then(|s| s.field("file")).unwrap();
        assert!(matches!(file, SchemaNode::Primitive { format: Some(f), .. } if f == "binary"));
    }

    #[test]
    fn test_custom_headers_become_parameters() {
        let (record, _) = single("curl https://x.io/a -H 'X-Request-Id: 9' -H 'Accept: */*' -b 'sid=1'");
        assert!(record.parameter("X-Request-Id", ParamLocation::Header).is_some());
        assert!(record.parameter("Accept", ParamLocation::Header).is_none());
        assert!(record.parameter("sid", ParamLocation::Cookie).is_some());
    }

    #[test]
    fn test_malformed_commands() {
        assert!(matches!(
            extract_curl("curl -X POST"),
            Err(AppError::MalformedCommand(_))
        ));
        assert!(matches!(
            extract_curl("curl 'https://x.io"),
            Err(AppError::MalformedCommand(_))
        ));
    }

    #[test]
    fn test_templated_url_keeps_path_params() {
        let (record, _) = single("curl https://api.x.com/users/{id}");
        assert_eq!(record.path, "/users/{id}");
        let id = record.parameter("id", ParamLocation::Path).unwrap();
        assert!(id.required);

        let (record, _) = single("curl 'https://api.x.com/users/:id/posts?x=1'");
        assert_eq!(record.path, "/users/{id}/posts");
        assert!(record.parameter("id", ParamLocation::Path).is_some());
        assert!(record.parameter("x", ParamLocation::Query).is_some());
    }

    #[test]
    fn test_schemeless_url_and_root_path() {
        let (record, result) = single("curl localhost:8080");
        assert_eq!(record.path, "/");
        assert_eq!(record.operation_id, "get_root");
        assert_eq!(
            result.project.base_url.as_deref(),
            Some("http://localhost:8080")
        );
    }
}
