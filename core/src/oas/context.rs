//! # Document Context
//!
//! Builds the per-call [`ProjectContext`] from a document's top level:
//! `info`, `servers` (or Swagger's `schemes`/`host`/`basePath`), the
//! security scheme table and the global `security` default.

use crate::error::AppResult;
use crate::models::{ProjectContext, ProjectMetadata};
use crate::oas::document::ParsedDocument;
use crate::oas::resolver::RefResolver;
use crate::oas::security::{collect_schemes, parse_security};
use serde_json::Value;

/// Reads the document-level context.
pub fn build_context(
    doc: &ParsedDocument,
    resolver: &mut RefResolver<'_>,
) -> AppResult<ProjectContext> {
    let root = doc.root();
    let info = root.get("info");
    let text = |v: Option<&Value>, key: &str| {
        v.and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let metadata = ProjectMetadata {
        title: text(info, "title"),
        version: text(info, "version"),
        base_url: if doc.is_swagger2() {
            swagger_base_url(root)
        } else {
            server_base_url(root)
        },
    };

    let mut ctx = ProjectContext::with_metadata(metadata);
    ctx.schemes = collect_schemes(root, resolver)?;
    ctx.global_security = root.get("security").and_then(parse_security);
    Ok(ctx)
}

/// First `servers[].url`, with `{variables}` replaced by their defaults.
fn server_base_url(root: &Value) -> Option<String> {
    let server = root.get("servers")?.as_array()?.first()?;
    let mut url = server.get("url")?.as_str()?.to_string();
    if let Some(Value::Object(vars)) = server.get("variables") {
        for (name, var) in vars {
            if let Some(default) = var.get("default").and_then(Value::as_str) {
                url = url.replace(&format!("{{{}}}", name), default);
            }
        }
    }
    Some(url.trim_end_matches('/').to_string())
}

/// `schemes[0]://host/basePath`.
fn swagger_base_url(root: &Value) -> Option<String> {
    let host = root.get("host")?.as_str()?;
    let scheme = root
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(Value::as_str)
        .unwrap_or("https");
    let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or("");
    Some(
        format!("{}://{}{}", scheme, host, base_path)
            .trim_end_matches('/')
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CyclePolicy;
    use crate::oas::DocumentFormat;

    fn context_of(text: &str) -> ProjectContext {
        let doc = ParsedDocument::parse(text, DocumentFormat::Auto).unwrap();
        let mut resolver = RefResolver::for_document(&doc, CyclePolicy::Placeholder);
        build_context(&doc, &mut resolver).unwrap()
    }

    #[test]
    fn test_oas3_metadata_with_server_variables() {
        let ctx = context_of(
            r#"
openapi: 3.0.3
info: {title: Pets, version: "1.2"}
servers:
  - url: https://{region}.example.com/api/
    variables:
      region: {default: eu}
security:
  - token: []
"#,
        );
        assert_eq!(ctx.metadata.title.as_deref(), Some("Pets"));
        assert_eq!(ctx.metadata.version.as_deref(), Some("1.2"));
        assert_eq!(
            ctx.metadata.base_url.as_deref(),
            Some("https://eu.example.com/api")
        );
        assert_eq!(ctx.global_security, Some(vec![vec!["token".to_string()]]));
    }

    #[test]
    fn test_swagger_base_url() {
        let ctx = context_of(
            r#"{"swagger": "2.0", "host": "api.example.com", "basePath": "/v2", "schemes": ["http"]}"#,
        );
        assert_eq!(
            ctx.metadata.base_url.as_deref(),
            Some("http://api.example.com/v2")
        );
        assert!(ctx.global_security.is_none());
    }
}
