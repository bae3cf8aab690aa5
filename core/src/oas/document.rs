#![deny(missing_docs)]

//! # OpenAPI Document Parsing
//!
//! Turns raw JSON or YAML text into a [`ParsedDocument`]: an immutable,
//! order-preserving `serde_json::Value` tree owned by one extraction call.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Declared format of the document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// JSON text.
    Json,
    /// YAML text.
    Yaml,
    /// Detect by looking at the first significant character.
    #[default]
    Auto,
}

impl DocumentFormat {
    /// Resolves `Auto` by sniffing the content: a leading `{` or `[` means JSON.
    pub fn detect(self, text: &str) -> DocumentFormat {
        match self {
            DocumentFormat::Auto => {
                let first = text
                    .trim_start_matches('\u{feff}')
                    .chars()
                    .find(|c| !c.is_whitespace());
                match first {
                    Some('{') | Some('[') => DocumentFormat::Json,
                    _ => DocumentFormat::Yaml,
                }
            }
            other => other,
        }
    }
}

/// A parsed OpenAPI / Swagger document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    root: Value,
    format: DocumentFormat,
}

impl ParsedDocument {
    /// Parses `text` according to `hint`.
    ///
    /// Fails with `DocumentParse` on malformed syntax, or when the root is not
    /// a mapping.
    pub fn parse(text: &str, hint: DocumentFormat) -> AppResult<Self> {
        let format = hint.detect(text);
        let root = match format {
            DocumentFormat::Json => {
                serde_json::from_str::<Value>(text).map_err(|e| AppError::from_json(&e))?
            }
            _ => {
                let yaml: serde_yaml::Value =
                    serde_yaml::from_str(text).map_err(|e| AppError::from_yaml(&e))?;
                yaml_to_json(yaml)
            }
        };

        if !root.is_object() {
            return Err(AppError::DocumentParse {
                message: "document root must be a mapping".into(),
                position: Default::default(),
            });
        }

        Ok(Self { root, format })
    }

    /// Wraps an already-parsed tree.
    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            format: DocumentFormat::Json,
        }
    }

    /// The document root.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The format the text was parsed as.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// The OAS 3.2 `$self` URI, if declared.
    pub fn self_uri(&self) -> Option<&str> {
        self.root.get("$self").and_then(Value::as_str)
    }

    /// Whether this is a Swagger 2.0 document.
    pub fn is_swagger2(&self) -> bool {
        self.root
            .get("swagger")
            .and_then(Value::as_str)
            .is_some_and(|v| v.starts_with('2'))
    }
}

/// Converts a YAML tree into a JSON tree.
///
/// YAML allows non-string mapping keys (`200:` is an integer), which JSON
/// does not, so scalar keys are stringified.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = Map::new();
            for (k, v) in mapping {
                out.insert(yaml_key(k), yaml_to_json(v));
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_json_by_leading_brace() {
        assert_eq!(DocumentFormat::Auto.detect("  \n{\"a\":1}"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::Auto.detect("openapi: 3.0.0"), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::Yaml.detect("{}"), DocumentFormat::Yaml);
    }

    #[test]
    fn test_yaml_integer_keys_become_strings() {
        let doc = ParsedDocument::parse(
            "responses:\n  200:\n    description: ok\n",
            DocumentFormat::Auto,
        )
        .unwrap();
        assert_eq!(doc.root()["responses"]["200"]["description"], "ok");
        assert_eq!(doc.format(), DocumentFormat::Yaml);
    }

    #[test]
    fn test_malformed_yaml_reports_position() {
        let err = ParsedDocument::parse("paths:\n  /a: [unclosed\n", DocumentFormat::Yaml)
            .unwrap_err();
        match err {
            AppError::DocumentParse { position, .. } => assert!(position.line.is_some()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scalar_root_is_rejected() {
        let err = ParsedDocument::parse("just text", DocumentFormat::Auto).unwrap_err();
        assert!(matches!(err, AppError::DocumentParse { .. }));
    }

    #[test]
    fn test_swagger_detection() {
        let doc = ParsedDocument::parse("{\"swagger\": \"2.0\"}", DocumentFormat::Json).unwrap();
        assert!(doc.is_swagger2());
    }
}
