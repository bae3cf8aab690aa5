#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helper functions for deriving stable operation identifiers from
//! `operationId`s or from the HTTP method and URL path.

/// Converts a mixed-case string (CamelCase, camelCase, kebab-case) to snake_case.
///
/// Runs of capitals are kept together (`getUserByID` → `get_user_by_id`), and
/// anything that is not alphanumeric becomes a single underscore.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            if c.is_uppercase() {
                let prev = i.checked_sub(1).map(|p| chars[p]);
                let next = chars.get(i + 1).copied();
                let boundary = match prev {
                    Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                    Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                    _ => false,
                };
                if boundary && !result.ends_with('_') {
                    result.push('_');
                }
                result.extend(c.to_lowercase());
            } else {
                result.push(c);
            }
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }
    result.trim_end_matches('_').to_string()
}

/// Derives an identifier from the HTTP method and URL path when `operationId`
/// is missing.
///
/// e.g. `GET /users/{id}` -> `get_users_id`, `GET /` -> `get_root`
pub fn derive_handler_name(method: &str, path: &str) -> String {
    let clean_path = to_snake_case(&path.replace(['{', '}', ':', '<', '>'], ""));
    if clean_path.is_empty() {
        return format!("{}_root", method.to_lowercase());
    }
    format!("{}_{}", method.to_lowercase(), clean_path)
}

/// The preferred identifier: the declared id in snake_case, else derived.
pub fn operation_name(declared: Option<&str>, method: &str, path: &str) -> String {
    declared
        .map(to_snake_case)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| derive_handler_name(method, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_conversion() {
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("camelCaseTemp"), "camel_case_temp");
        assert_eq!(to_snake_case("GetUsers"), "get_users");
        assert_eq!(to_snake_case("getUserByID"), "get_user_by_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("list-pets.v2"), "list_pets_v2");
    }

    #[test]
    fn test_derive_handler_name() {
        assert_eq!(derive_handler_name("GET", "/users"), "get_users");
        assert_eq!(
            derive_handler_name("POST", "/users/{id}/activate"),
            "post_users_id_activate"
        );
        assert_eq!(derive_handler_name("GET", "/"), "get_root");
        assert_eq!(derive_handler_name("DELETE", "/users/:id"), "delete_users_id");
    }

    #[test]
    fn test_operation_name_prefers_declared_id() {
        assert_eq!(operation_name(Some("listPets"), "GET", "/pets"), "list_pets");
        assert_eq!(operation_name(Some("--"), "GET", "/pets"), "get_pets");
        assert_eq!(operation_name(None, "GET", "/pets"), "get_pets");
    }
}
