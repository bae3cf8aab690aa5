//! # cURL Flag Parsing
//!
//! Interprets tokenized words as a curl invocation. Only the common flag set
//! is understood; well-known flags that do not affect the request shape are
//! consumed silently and anything else is reported as ignored.

use crate::error::{AppError, AppResult};
use crate::models::{Warning, WarningKind};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// Short flags without an argument that may be bundled (`-sSL`).
const BUNDLEABLE: &str = "sSLkvifNqO#46GIJlR";

/// Flags that take no argument and do not change the request shape.
const SILENT_SWITCHES: &[&str] = &[
    "-s",
    "--silent",
    "-S",
    "--show-error",
    "-L",
    "--location",
    "-k",
    "--insecure",
    "--compressed",
    "-v",
    "--verbose",
    "-i",
    "--include",
    "-f",
    "--fail",
    "--fail-with-body",
    "-N",
    "--no-buffer",
    "-#",
    "--progress-bar",
    "--http1.0",
    "--http1.1",
    "--http2",
    "--http3",
    "-g",
    "--globoff",
    "-O",
    "--remote-name",
    "-J",
    "--remote-header-name",
    "-q",
    "--basic",
    "--digest",
    "--location-trusted",
];

/// Flags whose argument does not change the request shape.
const SILENT_WITH_ARG: &[&str] = &[
    "-o",
    "--output",
    "-m",
    "--max-time",
    "--connect-timeout",
    "--retry",
    "--retry-delay",
    "--retry-max-time",
    "-x",
    "--proxy",
    "-U",
    "--proxy-user",
    "-w",
    "--write-out",
    "--cacert",
    "--capath",
    "-E",
    "--cert",
    "--key",
    "--cert-type",
    "-c",
    "--cookie-jar",
    "-D",
    "--dump-header",
    "--resolve",
    "--connect-to",
    "--limit-rate",
    "-r",
    "--range",
    "--interface",
    "-A",
    "--user-agent",
    "-e",
    "--referer",
    "-K",
    "--config",
];

/// How a data argument was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataArg {
    /// `-d`, `--data`, `--data-ascii`, `--data-binary`, `--data-raw`, `--json`.
    Raw(String),
    /// `--data-urlencode`, already encoded.
    Encoded(String),
    /// `-d @file`: payload read from a file at run time.
    File(String),
}

impl DataArg {
    /// Payload text as curl would send it (file payloads keep the `@path`).
    pub fn text(&self) -> &str {
        match self {
            DataArg::Raw(s) | DataArg::Encoded(s) | DataArg::File(s) => s,
        }
    }
}

/// A parsed curl invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurlCommand {
    /// `-X` value, uppercased.
    pub method: Option<String>,
    /// Raw URL text.
    pub url: Option<String>,
    /// `-H` values split at the first colon, in order.
    pub headers: Vec<(String, String)>,
    /// Data arguments, in order.
    pub data: Vec<DataArg>,
    /// `-F` fields.
    pub form: Vec<(String, String)>,
    /// `-b` cookie pairs.
    pub cookies: Vec<(String, String)>,
    /// `-u user:password`.
    pub user: Option<String>,
    /// `--oauth2-bearer` token.
    pub bearer: Option<String>,
    /// `-G`: data goes into the query string.
    pub get: bool,
    /// `-I`: HEAD request.
    pub head: bool,
    /// `--json` was used.
    pub json: bool,
}

impl CurlCommand {
    /// Header value by case-insensitive name (the last one wins).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parses tokens (starting with the `curl` word) into a command.
///
/// Returns the command plus one warning per ignored flag or argument.
pub fn parse_tokens(tokens: &[String]) -> AppResult<(CurlCommand, Vec<Warning>)> {
    let mut words = tokens.iter().map(String::as_str).peekable();

    // Tolerate a pasted shell prompt.
    if words.peek() == Some(&"$") {
        words.next();
    }
    match words.next() {
        Some(first) if first.rsplit(['/', '\\']).next().is_some_and(is_curl_binary) => {}
        Some(other) => {
            return Err(AppError::MalformedCommand(format!(
                "expected a curl command, found `{}`",
                other
            )))
        }
        None => return Err(AppError::MalformedCommand("empty command".into())),
    }

    let mut cmd = CurlCommand::default();
    let mut warnings = Vec::new();
    let mut options_done = false;

    while let Some(word) = words.next() {
        if options_done || !word.starts_with('-') || word == "-" {
            positional(&mut cmd, word, &mut warnings);
            continue;
        }
        if word == "--" {
            options_done = true;
            continue;
        }

        // `--flag=value` and `-Xvalue` forms.
        let (flag, inline) = split_inline(word);

        let mut value = |name: &str| -> AppResult<String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => words.next().map(str::to_string).ok_or_else(|| {
                    AppError::MalformedCommand(format!("flag `{}` expects a value", name))
                }),
            }
        };

        match flag {
            "-X" | "--request" => cmd.method = Some(value(flag)?.to_ascii_uppercase()),
            "--url" => cmd.url = Some(value(flag)?),
            "-H" | "--header" => {
                let raw = value(flag)?;
                match raw.split_once(':') {
                    Some((name, val)) => cmd
                        .headers
                        .push((name.trim().to_string(), val.trim().to_string())),
                    None => warnings.push(
                        Warning::new(
                            WarningKind::IgnoredCurlFlag,
                            format!("header without a colon: {}", raw),
                        )
                        .at(flag),
                    ),
                }
            }
            "-d" | "--data" | "--data-ascii" | "--data-binary" => {
                let raw = value(flag)?;
                cmd.data.push(match raw.strip_prefix('@') {
                    Some(path) => DataArg::File(path.to_string()),
                    None => DataArg::Raw(raw),
                });
            }
            "--data-raw" => cmd.data.push(DataArg::Raw(value(flag)?)),
            "--data-urlencode" => cmd.data.push(DataArg::Encoded(urlencode_arg(&value(flag)?))),
            "--json" => {
                cmd.json = true;
                cmd.data.push(DataArg::Raw(value(flag)?));
            }
            "-F" | "--form" | "--form-string" => {
                let raw = value(flag)?;
                match raw.split_once('=') {
                    Some((k, v)) => cmd.form.push((k.to_string(), v.to_string())),
                    None => warnings.push(
                        Warning::new(
                            WarningKind::IgnoredCurlFlag,
                            format!("form field without `=`: {}", raw),
                        )
                        .at(flag),
                    ),
                }
            }
            "-b" | "--cookie" => {
                let raw = value(flag)?;
                for pair in raw.split(';') {
                    if let Some((k, v)) = pair.split_once('=') {
                        cmd.cookies.push((k.trim().to_string(), v.trim().to_string()));
                    }
                }
            }
            "-u" | "--user" => cmd.user = Some(value(flag)?),
            "--oauth2-bearer" => cmd.bearer = Some(value(flag)?),
            "-G" | "--get" => cmd.get = true,
            "-I" | "--head" => cmd.head = true,
            f if SILENT_SWITCHES.contains(&f) => {}
            f if SILENT_WITH_ARG.contains(&f) => {
                value(f)?;
            }
            f if is_bundle(f) => {
                for short in f.chars().skip(1) {
                    match short {
                        'G' => cmd.get = true,
                        'I' => cmd.head = true,
                        _ => {}
                    }
                }
            }
            unknown => warnings.push(
                Warning::new(
                    WarningKind::IgnoredCurlFlag,
                    format!("ignored unsupported flag {}", unknown),
                )
                .at(unknown),
            ),
        }
    }

    if cmd.url.is_none() {
        return Err(AppError::MalformedCommand("no URL found".into()));
    }
    Ok((cmd, warnings))
}

fn is_curl_binary(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "curl" || name == "curl.exe"
}

fn positional(cmd: &mut CurlCommand, word: &str, warnings: &mut Vec<Warning>) {
    if cmd.url.is_none() {
        cmd.url = Some(word.to_string());
    } else {
        warnings.push(
            Warning::new(
                WarningKind::IgnoredCurlFlag,
                format!("ignored extra argument {}", word),
            )
            .at(word),
        );
    }
}

/// Splits `--flag=value` and attached short values (`-XPOST`, `-HAccept: x`).
fn split_inline(word: &str) -> (&str, Option<String>) {
    if let Some(long) = word.strip_prefix("--") {
        return match long.split_once('=') {
            Some((name, value)) => (&word[..name.len() + 2], Some(value.to_string())),
            None => (word, None),
        };
    }
    let mut chars = word.char_indices().skip(1);
    match (chars.next(), chars.next()) {
        (Some((_, short)), Some((rest_at, _))) if "XHdFubmoxAeUwEDrKc".contains(short) => {
            (&word[..rest_at], Some(word[rest_at..].to_string()))
        }
        _ => (word, None),
    }
}

fn is_bundle(flag: &str) -> bool {
    flag.len() > 1
        && !flag.starts_with("--")
        && flag.chars().skip(1).all(|c| BUNDLEABLE.contains(c))
}

/// `--data-urlencode` semantics: `name=content` encodes only the content,
/// a bare value is encoded whole.
fn urlencode_arg(raw: &str) -> String {
    let encode = |s: &str| utf8_percent_encode(s, NON_ALPHANUMERIC).to_string();
    match raw.split_once('=') {
        Some((name, content)) if !name.is_empty() => format!("{}={}", name, encode(content)),
        Some((_, content)) => encode(content),
        None => encode(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(command: &str) -> (CurlCommand, Vec<Warning>) {
        parse_tokens(&tokenize(command).unwrap()).unwrap()
    }

    #[test]
    fn test_common_flags() {
        let (cmd, warnings) = parse(
            "curl -sSL -X post https://api.x.com/users -H 'Content-Type: application/json' -d '{\"a\":1}' --oauth2-bearer tok",
        );
        assert_eq!(cmd.method.as_deref(), Some("POST"));
        assert_eq!(cmd.url.as_deref(), Some("https://api.x.com/users"));
        assert_eq!(cmd.header("content-type"), Some("application/json"));
        assert_eq!(cmd.data, vec![DataArg::Raw("{\"a\":1}".into())]);
        assert_eq!(cmd.bearer.as_deref(), Some("tok"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_inline_values() {
        let (cmd, _) = parse("curl -XDELETE --url=https://x.io/a --header=X-Id:7");
        assert_eq!(cmd.method.as_deref(), Some("DELETE"));
        assert_eq!(cmd.url.as_deref(), Some("https://x.io/a"));
        assert_eq!(cmd.headers, vec![("X-Id".to_string(), "7".to_string())]);
    }

    #[test]
    fn test_silent_flags_consume_arguments() {
        let (cmd, warnings) = parse("curl -o out.json -m 5 --compressed https://x.io/a");
        assert_eq!(cmd.url.as_deref(), Some("https://x.io/a"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unknown_flag_warns() {
        let (_, warnings) = parse("curl --frobnicate https://x.io/a");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::IgnoredCurlFlag);
        assert_eq!(warnings[0].location.as_deref(), Some("--frobnicate"));
    }

    #[test]
    fn test_data_urlencode_and_files() {
        let (cmd, _) = parse("curl https://x.io --data-urlencode 'q=a b&c' -d @body.json");
        assert_eq!(
            cmd.data,
            vec![
                DataArg::Encoded("q=a%20b%26c".into()),
                DataArg::File("body.json".into())
            ]
        );
    }

    #[test]
    fn test_missing_url_and_non_curl() {
        let no_url = parse_tokens(&tokenize("curl -X GET").unwrap());
        assert!(matches!(no_url, Err(AppError::MalformedCommand(_))));
        let wget = parse_tokens(&tokenize("wget https://x.io").unwrap());
        assert!(matches!(wget, Err(AppError::MalformedCommand(_))));
        let dangling = parse_tokens(&tokenize("curl https://x.io -H").unwrap());
        assert!(matches!(dangling, Err(AppError::MalformedCommand(_))));
    }
}
