//! # Reference Resolver
//!
//! Resolves internal `$ref` pointers into inline [`SchemaNode`] trees.
//!
//! A resolver is created per top-level extraction call and passed explicitly
//! through the call chain. Its in-progress set is the cycle guard: a pointer
//! met again while it is still being resolved is cut with a
//! `SelfReference` placeholder (or fails under [`CyclePolicy::Strict`]).
//! There is no depth cap besides that guard.

use crate::config::CyclePolicy;
use crate::error::{AppError, AppResult};
use crate::models::{SchemaNode, Warning, WarningKind};
use crate::oas::document::ParsedDocument;
use crate::oas::ref_utils::{lookup_pointer, normalize_ref_to_local};
use crate::oas::schemas::normalize_schema;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

static EMPTY_DOCUMENT: Value = Value::Null;

/// Per-call `$ref` resolver and warning sink.
pub struct RefResolver<'doc> {
    root: &'doc Value,
    self_uri: Option<String>,
    policy: CyclePolicy,
    in_progress: HashSet<String>,
    cycle_hits: usize,
    cache: HashMap<String, SchemaNode>,
    warnings: Vec<Warning>,
}

impl<'doc> RefResolver<'doc> {
    /// A resolver over an arbitrary tree.
    pub fn new(root: &'doc Value, policy: CyclePolicy) -> Self {
        Self {
            root,
            self_uri: root
                .get("$self")
                .and_then(Value::as_str)
                .map(str::to_string),
            policy,
            in_progress: HashSet::new(),
            cycle_hits: 0,
            cache: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// A resolver over a parsed document.
    pub fn for_document(doc: &'doc ParsedDocument, policy: CyclePolicy) -> Self {
        Self::new(doc.root(), policy)
    }

    /// A resolver with no document behind it; every local `$ref` fails.
    pub fn detached() -> RefResolver<'static> {
        RefResolver::new(&EMPTY_DOCUMENT, CyclePolicy::Placeholder)
    }

    /// Records a non-fatal warning for this call.
    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Drains the warnings gathered so far, in order.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Looks up a local pointer, failing with `ReferenceNotFound`.
    pub fn lookup(&self, pointer: &str) -> AppResult<&'doc Value> {
        lookup_pointer(self.root, pointer).ok_or_else(|| AppError::ReferenceNotFound {
            pointer: pointer.to_string(),
        })
    }

    /// Follows a `$ref` chain on a non-schema object (parameter, request
    /// body, response, path item) until an inline object is reached.
    ///
    /// Returns `Ok(None)` when the chain leaves the document or loops; both
    /// cases are recorded as warnings.
    pub fn deref<'v>(&mut self, value: &'v Value) -> AppResult<Option<&'v Value>>
    where
        'doc: 'v,
    {
        let mut current = value;
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(raw) = current.get("$ref").and_then(Value::as_str) {
            let Some(pointer) = normalize_ref_to_local(raw, self.self_uri.as_deref()) else {
                self.warn(
                    Warning::new(
                        WarningKind::UnresolvedReference,
                        format!("could not resolve external reference {}", raw),
                    )
                    .at(raw),
                );
                return Ok(None);
            };
            if !seen.insert(raw) {
                self.warn(
                    Warning::new(
                        WarningKind::ReferenceCycle,
                        format!("reference chain loops through {}", raw),
                    )
                    .at(raw),
                );
                return Ok(None);
            }
            current = lookup_pointer(self.root, &pointer).ok_or_else(|| {
                AppError::ReferenceNotFound {
                    pointer: raw.to_string(),
                }
            })?;
        }

        Ok(Some(current))
    }

    /// Resolves a schema `$ref` into a normalized node.
    pub fn resolve(&mut self, raw: &str) -> AppResult<SchemaNode> {
        let Some(pointer) = normalize_ref_to_local(raw, self.self_uri.as_deref()) else {
            self.warn(
                Warning::new(
                    WarningKind::UnresolvedReference,
                    format!("could not resolve external reference {}", raw),
                )
                .at(raw),
            );
            return Ok(SchemaNode::any());
        };

        if self.in_progress.contains(&pointer) {
            self.cycle_hits += 1;
            return match self.policy {
                CyclePolicy::Strict => Err(AppError::ReferenceCycle {
                    pointer: raw.to_string(),
                }),
                CyclePolicy::Placeholder => {
                    tracing::debug!(pointer = %pointer, "cutting reference cycle");
                    self.warn(
                        Warning::new(
                            WarningKind::ReferenceCycle,
                            format!("recursive reference {} replaced by a placeholder", raw),
                        )
                        .at(raw),
                    );
                    Ok(SchemaNode::SelfReference { pointer })
                }
            };
        }

        if let Some(cached) = self.cache.get(&pointer) {
            return Ok(cached.clone());
        }

        let target = lookup_pointer(self.root, &pointer).ok_or_else(|| {
            AppError::ReferenceNotFound {
                pointer: raw.to_string(),
            }
        })?;

        let hits_before = self.cycle_hits;
        self.in_progress.insert(pointer.clone());
        let resolved = normalize_schema(target, self);
        self.in_progress.remove(&pointer);
        let node = resolved?;

        // Only cycle-free expansions are context independent.
        if self.cycle_hits == hits_before {
            self.cache.insert(pointer, node.clone());
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrimitiveKind;
    use serde_json::json;

    #[test]
    fn test_resolves_simple_reference() {
        let doc = json!({"components": {"schemas": {"Id": {"type": "integer", "format": "int64"}}}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = resolver.resolve("#/components/schemas/Id").unwrap();
        assert_eq!(
            node,
            SchemaNode::Primitive {
                primitive: PrimitiveKind::Integer,
                format: Some("int64".into()),
                meta: Default::default(),
            }
        );
        assert!(resolver.take_warnings().is_empty());
    }

    #[test]
    fn test_missing_pointer_fails_with_exact_string() {
        let doc = json!({"components": {"schemas": {}}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        match resolver.resolve("#/components/schemas/Nope") {
            Err(AppError::ReferenceNotFound { pointer }) => {
                assert_eq!(pointer, "#/components/schemas/Nope")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle_of_length_one_terminates() {
        let doc = json!({"components": {"schemas": {"Loop": {"$ref": "#/components/schemas/Loop"}}}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = resolver.resolve("#/components/schemas/Loop").unwrap();
        assert_eq!(
            node,
            SchemaNode::SelfReference {
                pointer: "#/components/schemas/Loop".into()
            }
        );
        let warnings = resolver.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::ReferenceCycle);
    }

    #[test]
    fn test_recursive_tree_gets_placeholder_child() {
        let doc = json!({"components": {"schemas": {"Node": {
            "type": "object",
            "properties": {
                "value": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
            }
        }}}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = resolver.resolve("#/components/schemas/Node").unwrap();
        match node.field("children") {
            Some(SchemaNode::Array { items, .. }) => assert_eq!(
                **items,
                SchemaNode::SelfReference {
                    pointer: "#/components/schemas/Node".into()
                }
            ),
            other => panic!("unexpected children: {other:?}"),
        }
        assert!(!node.contains_reference());
    }

    #[test]
    fn test_strict_policy_fails_on_cycle() {
        let doc = json!({"components": {"schemas": {
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/A"}
        }}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Strict);
        assert!(matches!(
            resolver.resolve("#/components/schemas/A"),
            Err(AppError::ReferenceCycle { .. })
        ));
    }

    #[test]
    fn test_external_reference_degrades_to_any() {
        let doc = json!({});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = resolver.resolve("common.yaml#/Error").unwrap();
        assert!(node.is_any());
        assert_eq!(
            resolver.take_warnings()[0].kind,
            WarningKind::UnresolvedReference
        );
    }

    #[test]
    fn test_deref_follows_parameter_chain() {
        let doc = json!({"components": {"parameters": {
            "Limit": {"$ref": "#/components/parameters/RealLimit"},
            "RealLimit": {"name": "limit", "in": "query"}
        }}});
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let start = json!({"$ref": "#/components/parameters/Limit"});
        let resolved = resolver.deref(&start).unwrap().unwrap();
        assert_eq!(resolved["name"], "limit");
    }

    #[test]
    fn test_self_uri_reference_is_local() {
        let doc = json!({
            "$self": "https://example.com/openapi.yaml",
            "components": {"schemas": {"Flag": {"type": "boolean"}}}
        });
        let mut resolver = RefResolver::new(&doc, CyclePolicy::Placeholder);
        let node = resolver
            .resolve("https://example.com/openapi.yaml#/components/schemas/Flag")
            .unwrap();
        assert_eq!(node, SchemaNode::primitive(PrimitiveKind::Boolean));
    }
}
