//! # Text Helpers
//!
//! Small lexical utilities shared by the regex based matchers.

use regex::Regex;
use std::sync::OnceLock;

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// The trimmed text of the line containing `offset`.
pub fn line_at(source: &str, offset: usize) -> &str {
    let offset = offset.min(source.len());
    let start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = source[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(source.len());
    source[start..end].trim()
}

/// Returns the text between the parenthesis at `open` and its matching
/// close, skipping over quoted strings. `None` if unbalanced.
pub fn balanced_args(source: &str, open: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every quoted literal in `text`, in order. Handles `'`, `"` and backticks,
/// plus Python `r`/`f`/`b` prefixes.
pub fn string_literals(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'|`([^`]*)`"#).expect("Invalid regex")
    });
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).or(caps.get(2)).or(caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The first quoted literal in `text`.
pub fn first_literal(text: &str) -> Option<String> {
    string_literals(text).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_helpers() {
        let src = "a\n  b = 1\nc";
        let offset = src.find('b').unwrap();
        assert_eq!(line_of(src, offset), 2);
        assert_eq!(line_at(src, offset), "b = 1");
        assert_eq!(line_of(src, 0), 1);
    }

    #[test]
    fn test_balanced_args_skip_strings() {
        let src = r#"route("/x(", methods=["GET"]) trailing"#;
        let open = src.find('(').unwrap();
        assert_eq!(
            balanced_args(src, open),
            Some(r#""/x(", methods=["GET"]"#)
        );
        assert_eq!(balanced_args("f(a", 1), None);
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            string_literals(r#"'/a', "/b", `/c/${id}`"#),
            vec!["/a", "/b", "/c/${id}"]
        );
        assert_eq!(first_literal("no strings here"), None);
    }
}
