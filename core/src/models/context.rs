//! # Project Context
//!
//! Metadata shared across one extraction call: base URL, the security scheme
//! table, the document-wide security default and the operation-id counters.
//! Created at the start of a call and dropped with it.

use crate::models::endpoint::AuthRequirement;
use crate::models::result::ProjectMetadata;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// One alternative of a security requirement list: every named scheme must
/// be satisfied together.
pub type SecurityAlternative = Vec<String>;

/// Per-call shared state.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    /// Title, version and base URL.
    pub metadata: ProjectMetadata,
    /// Declared security schemes by name.
    pub schemes: IndexMap<String, AuthRequirement>,
    /// Document-level `security`; `None` when the document has none.
    pub global_security: Option<Vec<SecurityAlternative>>,
    name_counters: HashMap<String, usize>,
    taken_names: HashSet<String>,
}

impl ProjectContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying only metadata.
    pub fn with_metadata(metadata: ProjectMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Reserves `candidate` as an operation id, suffixing `_2`, `_3`, ... on
    /// collision.
    pub fn unique_operation_id(&mut self, candidate: &str) -> String {
        let counter = self.name_counters.entry(candidate.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let attempt = match *counter {
                1 => candidate.to_string(),
                n => format!("{}_{}", candidate, n),
            };
            if self.taken_names.insert(attempt.clone()) {
                return attempt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_ids_get_suffixes() {
        let mut ctx = ProjectContext::new();
        assert_eq!(ctx.unique_operation_id("get_ping"), "get_ping");
        assert_eq!(ctx.unique_operation_id("get_ping"), "get_ping_2");
        assert_eq!(ctx.unique_operation_id("get_ping"), "get_ping_3");
        assert_eq!(ctx.unique_operation_id("get_ping_2"), "get_ping_2_2");
    }
}
