//! # Path Templates
//!
//! Rewrites framework specific path syntax into `{param}` templates and
//! synthesizes the matching path parameters.
//!
//! | framework               | written             | normalized   |
//! |-------------------------|---------------------|--------------|
//! | Express / gin / Rails   | `/users/:id`        | `/users/{id}`|
//! | Flask / Rocket          | `/users/<int:id>`   | `/users/{id}`|
//! | FastAPI / Starlette     | `/files/{p:path}`   | `/files/{p}` |
//! | gorilla/mux             | `/a/{id:[0-9]+}`    | `/a/{id}`    |
//! | axum / Express wildcard | `/*rest`, `{*rest}` | `/{rest}`    |

use crate::models::{ParamLocation, Parameter, PrimitiveKind, SchemaNode};
use regex::Regex;
use std::sync::OnceLock;

/// A placeholder discovered in a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    /// Placeholder name.
    pub name: String,
    /// Type implied by a converter or constraint, `String` otherwise.
    pub kind: PrimitiveKind,
}

impl PathParam {
    /// The required `path` parameter for this placeholder.
    pub fn to_parameter(&self) -> Parameter {
        Parameter {
            name: self.name.clone(),
            location: ParamLocation::Path,
            required: true,
            schema: SchemaNode::primitive(self.kind),
            description: None,
        }
    }
}

/// Joins a router prefix and a route path with exactly one `/` between them.
///
/// An empty route path yields the prefix itself.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.is_empty() {
        return if prefix.is_empty() {
            "/".to_string()
        } else if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };
    }
    let joined = format!("{}/{}", prefix, path.trim_start_matches('/'));
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{}", joined)
    }
}

fn converter_kind(converter: &str) -> PrimitiveKind {
    match converter.trim() {
        "int" | "i32" | "i64" | "u32" | "u64" | "usize" | "long" | "Long" => PrimitiveKind::Integer,
        r"\d+" | "[0-9]+" | r"\d*" => PrimitiveKind::Integer,
        "float" | "number" | "double" => PrimitiveKind::Number,
        _ => PrimitiveKind::String,
    }
}

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:\{\*?([A-Za-z_]\w*)(?::([^}]*))?\}|<(?:([A-Za-z_]\w*):)?([A-Za-z_]\w*)>|:([A-Za-z_]\w*)(?:\(([^)]*)\))?\??|\*([A-Za-z_]\w*))$",
        )
        .expect("Invalid regex")
    })
}

/// Normalizes a route path to `{param}` form.
///
/// Returns the template and its placeholders in order of appearance.
/// Query strings and fragments are stripped; a bare `*` becomes `{wildcard}`.
pub fn normalize_template(raw: &str) -> (String, Vec<PathParam>) {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let mut params = Vec::new();
    let mut segments = Vec::new();

    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment == "*" {
            params.push(PathParam {
                name: "wildcard".into(),
                kind: PrimitiveKind::String,
            });
            segments.push("{wildcard}".to_string());
            continue;
        }
        let Some(caps) = segment_re().captures(segment) else {
            segments.push(segment.to_string());
            continue;
        };
        let (name, kind) = if let Some(name) = caps.get(1) {
            // {name} / {name:constraint} / {*name}
            let kind = caps.get(2).map_or(PrimitiveKind::String, |c| converter_kind(c.as_str()));
            (name.as_str(), kind)
        } else if let Some(name) = caps.get(4) {
            // <name> / <converter:name>
            let kind = caps.get(3).map_or(PrimitiveKind::String, |c| converter_kind(c.as_str()));
            (name.as_str(), kind)
        } else if let Some(name) = caps.get(5) {
            // :name / :name(regex)
            let kind = caps.get(6).map_or(PrimitiveKind::String, |c| converter_kind(c.as_str()));
            (name.as_str(), kind)
        } else if let Some(name) = caps.get(7) {
            (name.as_str(), PrimitiveKind::String)
        } else {
            segments.push(segment.to_string());
            continue;
        };
        segments.push(format!("{{{}}}", name));
        if !params.iter().any(|p: &PathParam| p.name == name) {
            params.push(PathParam {
                name: name.to_string(),
                kind,
            });
        }
    }

    let mut template = format!("/{}", segments.join("/"));
    if path.ends_with('/') && !segments.is_empty() {
        template.push('/');
    }
    (template, params)
}
