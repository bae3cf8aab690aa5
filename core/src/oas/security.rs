//! # Security Requirements
//!
//! Reads the document's security scheme table and maps an operation's
//! security requirement onto an [`AuthRequirement`].
//!
//! Lookup order for an operation: its own `security`, then the document-level
//! `security`, then none. An explicit empty list (`security: []`) clears auth.

use crate::error::AppResult;
use crate::models::{
    AuthRequirement, ParamLocation, SecurityAlternative, Warning, WarningKind,
};
use crate::oas::resolver::RefResolver;
use indexmap::IndexMap;
use serde_json::Value;

/// Collects `components.securitySchemes` (OAS 3) or `securityDefinitions`
/// (Swagger 2) into a name → requirement table.
pub fn collect_schemes(
    root: &Value,
    resolver: &mut RefResolver<'_>,
) -> AppResult<IndexMap<String, AuthRequirement>> {
    let table = root
        .pointer("/components/securitySchemes")
        .or_else(|| root.get("securityDefinitions"));

    let mut schemes = IndexMap::new();
    let Some(Value::Object(entries)) = table else {
        return Ok(schemes);
    };

    for (name, raw) in entries {
        let Some(definition) = resolver.deref(raw)? else {
            continue;
        };
        schemes.insert(name.clone(), map_scheme(name, definition));
    }
    Ok(schemes)
}

fn map_scheme(name: &str, definition: &Value) -> AuthRequirement {
    let kind = definition.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "http" => {
            let scheme = definition
                .get("scheme")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_ascii_lowercase();
            match scheme.as_str() {
                "bearer" => AuthRequirement::Bearer {
                    format: definition
                        .get("bearerFormat")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
                "basic" => AuthRequirement::Basic,
                _ => AuthRequirement::Unknown {
                    scheme: name.to_string(),
                },
            }
        }
        "basic" => AuthRequirement::Basic,
        "apiKey" => AuthRequirement::ApiKey {
            name: definition
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            location: definition
                .get("in")
                .and_then(Value::as_str)
                .and_then(ParamLocation::parse)
                .unwrap_or(ParamLocation::Header),
        },
        // Both carry an access token in `Authorization: Bearer`.
        "oauth2" | "openIdConnect" => AuthRequirement::Bearer { format: None },
        _ => AuthRequirement::Unknown {
            scheme: name.to_string(),
        },
    }
}

/// Parses a `security` list: one alternative per entry, scheme names as keys.
pub fn parse_security(value: &Value) -> Option<Vec<SecurityAlternative>> {
    let Value::Array(entries) = value else {
        return None;
    };
    Some(
        entries
            .iter()
            .map(|entry| match entry {
                Value::Object(map) => map.keys().cloned().collect(),
                _ => Vec::new(),
            })
            .collect(),
    )
}

/// Resolves the effective auth of one operation.
///
/// The first alternative whose schemes are all declared wins; an empty
/// alternative (`{}`) means anonymous access. Undeclared names produce one
/// warning for the operation, and `Unknown` when nothing else is satisfiable.
pub fn resolve_auth(
    operation_security: Option<&Value>,
    global: Option<&[SecurityAlternative]>,
    schemes: &IndexMap<String, AuthRequirement>,
    location: &str,
) -> (AuthRequirement, Option<Warning>) {
    let own = operation_security.and_then(parse_security);
    let alternatives: &[SecurityAlternative] = match (&own, global) {
        (Some(list), _) => list.as_slice(),
        (None, Some(list)) => list,
        (None, None) => return (AuthRequirement::None, None),
    };

    let undefined: Vec<&str> = alternatives
        .iter()
        .flatten()
        .filter(|name| !schemes.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();

    let warning = (!undefined.is_empty()).then(|| {
        Warning::new(
            WarningKind::UnknownSecurityScheme,
            format!("undefined security scheme(s): {}", undefined.join(", ")),
        )
        .at(location)
    });

    for alternative in alternatives {
        if alternative.is_empty() {
            return (AuthRequirement::None, warning);
        }
        if alternative.iter().all(|name| schemes.contains_key(name)) {
            if let Some(auth) = schemes.get(&alternative[0]) {
                return (auth.clone(), warning);
            }
        }
    }

    match undefined.first() {
        Some(name) => (
            AuthRequirement::Unknown {
                scheme: name.to_string(),
            },
            warning,
        ),
        // `security: []`
        None => (AuthRequirement::None, warning),
    }
}
