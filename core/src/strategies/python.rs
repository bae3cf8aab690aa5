//! # Python Matcher
//!
//! Decorator based registrations:
//!
//! * FastAPI: `@app.get("/x")`, `@router.post(...)`, `@app.api_route(..., methods=[...])`
//! * Flask: `@app.route("/x", methods=["GET", "POST"])`, `@bp.get("/x")`
//!
//! Router prefixes declared in the same file (`APIRouter(prefix=...)`,
//! `Blueprint(..., url_prefix=...)`) are applied by variable name.

use crate::models::HttpMethod;
use crate::scanner::paths::join_paths;
use crate::strategies::text::{balanced_args, first_literal, line_at, line_of, string_literals};
use crate::strategies::traits::{RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// FastAPI / Flask / Starlette decorators.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonDecoratorMatcher;

fn decorator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*@([A-Za-z_][\w.]*)\.(get|post|put|patch|delete|head|options|route|api_route)[ \t]*\(",
        )
        .expect("Invalid regex")
    })
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*([A-Za-z_]\w*)\s*=\s*(?:[\w.]+\.)?(APIRouter|Blueprint)\s*\(")
            .expect("Invalid regex")
    })
}

fn keyword_literal_re(keyword: &str) -> Regex {
    Regex::new(&format!(r#"\b{}\s*=\s*[rfb]?["']([^"']*)["']"#, keyword)).expect("Invalid regex")
}

fn def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)").expect("Invalid regex")
    })
}

fn guard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"login_required|jwt_required|auth_required|token_required|permission_required|Security\s*\(|Depends\s*\(\s*(?:get_current_\w*|\w*auth\w*|\w*token\w*|oauth2_scheme)",
        )
        .expect("Invalid regex")
    })
}

/// `variable -> prefix` for routers declared in this file.
fn router_prefixes(source: &str) -> HashMap<String, String> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    static URL_PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX.get_or_init(|| keyword_literal_re("prefix"));
    let url_prefix = URL_PREFIX.get_or_init(|| keyword_literal_re("url_prefix"));

    let mut out = HashMap::new();
    for caps in prefix_re().captures_iter(source) {
        let (Some(var), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let Some(args) = balanced_args(source, whole.end() - 1) else {
            continue;
        };
        let re = if &caps[2] == "Blueprint" { url_prefix } else { prefix };
        if let Some(p) = re.captures(args).and_then(|c| c.get(1)) {
            out.insert(var.as_str().to_string(), p.as_str().to_string());
        }
    }
    out
}

/// Verbs listed in a `methods=[...]` keyword; GET when absent.
fn listed_methods(args: &str) -> Vec<HttpMethod> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\bmethods\s*=\s*[\[(\{]([^\])\}]*)[\])\}]").expect("Invalid regex")
    });
    let listed: Vec<HttpMethod> = re
        .captures(args)
        .map(|caps| {
            string_literals(&caps[1])
                .iter()
                .filter_map(|m| HttpMethod::parse(m))
                .collect()
        })
        .unwrap_or_default();
    if listed.is_empty() {
        vec![HttpMethod::Get]
    } else {
        listed
    }
}

impl RouteMatcher for PythonDecoratorMatcher {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let prefixes = router_prefixes(source);
        let mut scan = RouteScan::default();

        for caps in decorator_re().captures_iter(source) {
            let (Some(whole), Some(object), Some(verb)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let open = whole.end() - 1;
            let Some(args) = balanced_args(source, open) else {
                continue;
            };
            let line = line_of(source, whole.start());
            let snippet = line_at(source, whole.start());
            let Some(raw_path) = first_literal(args) else {
                scan.unresolved.push(UnresolvedRoute::new(line, snippet));
                continue;
            };

            let methods = match verb.as_str() {
                "route" | "api_route" => listed_methods(args),
                other => HttpMethod::parse(other).into_iter().collect(),
            };

            // Decorator stack through the end of the `def` signature.
            let after = &source[whole.start()..];
            let def = def_re().captures(after);
            let handler = def.as_ref().and_then(|d| d.get(1)).map(|m| m.as_str().to_string());
            let window_end = def
                .as_ref()
                .and_then(|d| d.get(0))
                .and_then(|m| {
                    let open = m.end() + after[m.end()..].find('(')?;
                    balanced_args(after, open).map(|params| open + params.len() + 2)
                })
                .unwrap_or_else(|| (whole.end() - whole.start() + args.len() + 1).min(after.len()));
            let authenticated = guard_re().is_match(&after[..window_end]);

            let path = match prefixes.get(object.as_str()) {
                Some(prefix) => join_paths(prefix, &raw_path),
                None => raw_path,
            };
            for method in methods {
                scan.routes.push(
                    RouteMatch::new(method, path.clone(), line, snippet)
                        .with_handler(handler.clone())
                        .guarded(authenticated),
                );
            }
        }
        scan
    }
}
