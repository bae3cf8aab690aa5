//! # Schema Nodes
//!
//! Canonical, source-independent representation of a data shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Primitive JSON types, plus `Any` for fragments that carry no type signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// Unknown shape; accepts anything.
    Any,
}

impl PrimitiveKind {
    /// Maps a JSON-Schema `type` keyword to a primitive kind.
    ///
    /// Returns `None` for `object` / `array` and unknown names.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// The JSON-Schema keyword for this kind (`None` for `Any`).
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Null => Some("null"),
            Self::Any => None,
        }
    }
}

/// Optional annotations and constraints carried alongside a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMeta {
    /// Short label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Value assumed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// `null` is accepted as well.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Inclusive numeric lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive numeric upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl SchemaMeta {
    /// True when no annotation is set.
    pub fn is_empty(&self) -> bool {
        *self == SchemaMeta::default()
    }

    fn write_into(&self, out: &mut Map<String, Value>) {
        if let Some(t) = &self.title {
            out.insert("title".into(), json!(t));
        }
        if let Some(d) = &self.description {
            out.insert("description".into(), json!(d));
        }
        if let Some(e) = &self.example {
            out.insert("example".into(), e.clone());
        }
        if let Some(d) = &self.default {
            out.insert("default".into(), d.clone());
        }
        if self.nullable {
            out.insert("nullable".into(), json!(true));
        }
        if let Some(v) = self.min_length {
            out.insert("minLength".into(), json!(v));
        }
        if let Some(v) = self.max_length {
            out.insert("maxLength".into(), json!(v));
        }
        if let Some(v) = self.minimum {
            out.insert("minimum".into(), json!(v));
        }
        if let Some(v) = self.maximum {
            out.insert("maximum".into(), json!(v));
        }
        if let Some(p) = &self.pattern {
            out.insert("pattern".into(), json!(p));
        }
    }
}

/// A normalized data shape.
///
/// `Reference` only exists while a document is being resolved; extractor
/// output never contains it. Cycles are cut with `SelfReference`, which keeps
/// the pointer of the schema the cycle re-entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    /// Scalar value.
    Primitive {
        /// Scalar kind.
        primitive: PrimitiveKind,
        /// Format hint such as `date-time` or `email`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        /// Annotations and constraints.
        #[serde(default, skip_serializing_if = "SchemaMeta::is_empty")]
        meta: SchemaMeta,
    },
    /// Homogeneous list.
    Array {
        /// Element shape.
        items: Box<SchemaNode>,
        /// Annotations and constraints.
        #[serde(default, skip_serializing_if = "SchemaMeta::is_empty")]
        meta: SchemaMeta,
    },
    /// Record with ordered fields.
    Object {
        /// Fields in declaration order.
        fields: IndexMap<String, SchemaNode>,
        /// Names of the fields that must be present.
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        required: BTreeSet<String>,
        /// Annotations and constraints.
        #[serde(default, skip_serializing_if = "SchemaMeta::is_empty")]
        meta: SchemaMeta,
    },
    /// Unresolved pointer.
    Reference {
        /// Target of the `$ref`.
        pointer: String,
    },
    /// Closed set of values over a base type.
    Enum {
        /// Shape every value conforms to.
        base: Box<SchemaNode>,
        /// Allowed values in declaration order.
        values: Vec<Value>,
        /// Annotations and constraints.
        #[serde(default, skip_serializing_if = "SchemaMeta::is_empty")]
        meta: SchemaMeta,
    },
    /// Cycle placeholder pointing back at the cycle's entry.
    SelfReference {
        /// Pointer of the schema the cycle re-entered.
        pointer: String,
    },
}

impl SchemaNode {
    /// The "unknown/any" fallback node.
    pub fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    /// A bare primitive without format or annotations.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        SchemaNode::Primitive {
            primitive: kind,
            format: None,
            meta: SchemaMeta::default(),
        }
    }

    /// A bare string node.
    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    /// An empty object node.
    pub fn empty_object() -> Self {
        SchemaNode::Object {
            fields: IndexMap::new(),
            required: BTreeSet::new(),
            meta: SchemaMeta::default(),
        }
    }

    /// Whether this is the `Any` primitive.
    pub fn is_any(&self) -> bool {
        matches!(
            self,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::Any,
                ..
            }
        )
    }

    /// Mutable access to annotations, for variants that carry them.
    pub fn meta_mut(&mut self) -> Option<&mut SchemaMeta> {
        match self {
            SchemaNode::Primitive { meta, .. }
            | SchemaNode::Array { meta, .. }
            | SchemaNode::Object { meta, .. }
            | SchemaNode::Enum { meta, .. } => Some(meta),
            SchemaNode::Reference { .. } | SchemaNode::SelfReference { .. } => None,
        }
    }

    /// Shared access to annotations, for variants that carry them.
    pub fn meta(&self) -> Option<&SchemaMeta> {
        match self {
            SchemaNode::Primitive { meta, .. }
            | SchemaNode::Array { meta, .. }
            | SchemaNode::Object { meta, .. }
            | SchemaNode::Enum { meta, .. } => Some(meta),
            SchemaNode::Reference { .. } | SchemaNode::SelfReference { .. } => None,
        }
    }

    /// Field lookup for object nodes.
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Whether a transient `Reference` is reachable from this node.
    pub fn contains_reference(&self) -> bool {
        match self {
            SchemaNode::Reference { .. } => true,
            SchemaNode::Array { items, .. } => items.contains_reference(),
            SchemaNode::Object { fields, .. } => fields.values().any(|f| f.contains_reference()),
            SchemaNode::Enum { base, .. } => base.contains_reference(),
            SchemaNode::Primitive { .. } | SchemaNode::SelfReference { .. } => false,
        }
    }

    /// Renders the node as a JSON-Schema fragment.
    ///
    /// `SelfReference` renders as `{"$ref": pointer}` so consumers can re-link
    /// the cycle against the original document.
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        match self {
            SchemaNode::Primitive {
                primitive,
                format,
                meta,
            } => {
                if let Some(name) = primitive.type_name() {
                    out.insert("type".into(), json!(name));
                }
                if let Some(f) = format {
                    out.insert("format".into(), json!(f));
                }
                meta.write_into(&mut out);
            }
            SchemaNode::Array { items, meta } => {
                out.insert("type".into(), json!("array"));
                out.insert("items".into(), items.to_json_schema());
                meta.write_into(&mut out);
            }
            SchemaNode::Object {
                fields,
                required,
                meta,
            } => {
                out.insert("type".into(), json!("object"));
                let props: Map<String, Value> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_schema()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
                meta.write_into(&mut out);
            }
            SchemaNode::Enum { base, values, meta } => {
                if let Value::Object(base_map) = base.to_json_schema() {
                    out.extend(base_map);
                }
                out.insert("enum".into(), Value::Array(values.clone()));
                meta.write_into(&mut out);
            }
            SchemaNode::Reference { pointer } | SchemaNode::SelfReference { pointer } => {
                out.insert("$ref".into(), json!(pointer));
            }
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_reference_renders_as_ref() {
        let node = SchemaNode::SelfReference {
            pointer: "#/components/schemas/Node".into(),
        };
        assert_eq!(
            node.to_json_schema(),
            json!({"$ref": "#/components/schemas/Node"})
        );
    }

    #[test]
    fn test_object_rendering_keeps_field_order_and_required() {
        let mut fields = IndexMap::new();
        fields.insert("z".to_string(), SchemaNode::string());
        fields.insert("a".to_string(), SchemaNode::primitive(PrimitiveKind::Integer));
        let node = SchemaNode::Object {
            fields,
            required: BTreeSet::from(["z".to_string()]),
            meta: SchemaMeta::default(),
        };
        let rendered = node.to_json_schema();
        let keys: Vec<&String> = rendered["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(rendered["required"], json!(["z"]));
    }

    #[test]
    fn test_contains_reference_walks_children() {
        let node = SchemaNode::Array {
            items: Box::new(SchemaNode::Reference {
                pointer: "#/x".into(),
            }),
            meta: SchemaMeta::default(),
        };
        assert!(node.contains_reference());
        assert!(!SchemaNode::any().contains_reference());
    }

    #[test]
    fn test_serde_tagging() {
        let value = serde_json::to_value(SchemaNode::string()).unwrap();
        assert_eq!(value, json!({"kind": "primitive", "primitive": "string"}));
    }
}
