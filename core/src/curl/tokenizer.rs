//! # Shell Tokenizer
//!
//! Splits a pasted shell command into words. Supports single quotes, double
//! quotes (with `\"`, `\\`, `\$` and `` \` `` escapes), ANSI-C `$'...'`
//! quoting and backslash-newline continuations. Globbing, variables and
//! command substitution are left as literal text.

use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
    AnsiC,
}

/// Splits `command` into shell words.
///
/// Fails with `MalformedCommand` when a quote is left open.
pub fn tokenize(command: &str) -> AppResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote = Quote::None;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.peek().copied() {
                    Some(next @ ('"' | '\\' | '$' | '`')) => {
                        current.push(next);
                        chars.next();
                    }
                    Some('\n') => {
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                _ => current.push(c),
            },
            Quote::AnsiC => match c {
                '\'' => quote = Quote::None,
                '\\' => {
                    let Some(next) = chars.next() else {
                        current.push('\\');
                        continue;
                    };
                    match next {
                        'n' => current.push('\n'),
                        't' => current.push('\t'),
                        'r' => current.push('\r'),
                        '0' => current.push('\0'),
                        '\\' | '\'' | '"' | '?' => current.push(next),
                        other => {
                            current.push('\\');
                            current.push(other);
                        }
                    }
                }
                _ => current.push(c),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    in_token = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_token = true;
                }
                '$' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    quote = Quote::AnsiC;
                    in_token = true;
                }
                '\\' => match chars.peek().copied() {
                    // Line continuation.
                    Some('\n') => {
                        chars.next();
                    }
                    Some('\r') => {
                        chars.next();
                        if chars.peek() == Some(&'\n') {
                            chars.next();
                        }
                    }
                    _ => {
                        current.push('\\');
                        in_token = true;
                    }
                },
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                _ => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(AppError::MalformedCommand(
            "unterminated quoted string".into(),
        ));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quotes_and_continuations() {
        let tokens = tokenize(
            "curl -X POST \\\n  'https://api.x.com/users' \\\n  -H \"Content-Type: application/json\" -d '{\"name\":\"a\"}'",
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec![
                "curl",
                "-X",
                "POST",
                "https://api.x.com/users",
                "-H",
                "Content-Type: application/json",
                "-d",
                "{\"name\":\"a\"}",
            ]
        );
    }

    #[test]
    fn test_escapes_only_inside_double_quotes() {
        let tokens = tokenize(r#"echo "a \"b\" \n" 'c \"d'"#).unwrap();
        assert_eq!(tokens, vec!["echo", "a \"b\" \\n", "c \\\"d"]);
    }

    #[test]
    fn test_ansi_c_quoting() {
        let tokens = tokenize(r#"curl --data-raw $'{\"a\":\'x\'}\n'"#).unwrap();
        assert_eq!(tokens, vec!["curl", "--data-raw", "{\"a\":'x'}\n"]);
    }

    #[test]
    fn test_empty_quoted_word_is_kept() {
        assert_eq!(tokenize("a '' b").unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_unterminated_quote_fails() {
        assert!(matches!(
            tokenize("curl 'https://x"),
            Err(AppError::MalformedCommand(_))
        ));
    }
}
