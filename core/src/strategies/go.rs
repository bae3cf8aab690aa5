//! # Go Matcher
//!
//! * gin / echo / fiber: `r.GET("/x", h)`, `e.POST("/x", h)`, `app.Get("/x", h)`
//! * chi: `r.Get("/x", h)`, `r.With(auth).Delete("/x", h)`
//! * gorilla/mux: `r.HandleFunc("/x", h).Methods("GET", "POST")`
//! * net/http (Go 1.22 patterns): `mux.HandleFunc("GET /x", h)`
//!
//! Route groups (`api := r.Group("/api")`, `r.Route("/api", ...)`) are not
//! followed; their routes keep the path as written.

use crate::models::HttpMethod;
use crate::strategies::text::{balanced_args, line_at, line_of, string_literals};
use crate::strategies::traits::{RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};
use regex::Regex;
use std::sync::OnceLock;

/// Router method calls in Go sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoRouterMatcher;

fn verb_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\.(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS|Get|Post|Put|Patch|Delete|Head|Options)\(\s*"(/[^"]*)""#,
        )
        .expect("Invalid regex")
    })
}

fn handle_func_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\.(?:HandleFunc|Handle)\(\s*"([^"]*)""#).expect("Invalid regex"))
}

/// A registration whose pattern is a constant or expression instead of a literal.
fn dynamic_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:r|e|g|app|api|mux|http|v\d+|[a-z]*[Rr]outer|[a-z]*[Gg]roup)\.(?:GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS|Get|Post|Put|Patch|Delete|Head|Options|HandleFunc|Handle)\(\s*[A-Za-z_][\w.]*\s*,",
        )
        .expect("Invalid regex")
    })
}

fn go_guard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b\w*(?:auth\w*|jwt\w*|requirelogin|protected)\b").expect("Invalid regex")
    })
}

impl RouteMatcher for GoRouterMatcher {
    fn name(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let mut routes = Vec::new();

        for caps in verb_call_re().captures_iter(source) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let Some(method) = HttpMethod::parse(&caps[1]) else {
                continue;
            };
            let line_text = line_at(source, whole.start());
            // Middleware in the call or a chi `With(...)` prefix on the same line.
            let guarded = go_guard_re().is_match(line_text);
            routes.push(
                RouteMatch::new(method, path.as_str(), line_of(source, whole.start()), line_text)
                    .guarded(guarded),
            );
        }

        for caps in handle_func_re().captures_iter(source) {
            let (Some(whole), Some(pattern)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let line = line_of(source, whole.start());
            let snippet = line_at(source, whole.start());
            let guarded = go_guard_re().is_match(snippet);

            // `"GET /items/{id}"` style pattern.
            if let Some((verb, path)) = pattern.as_str().split_once(' ') {
                if let Some(method) = HttpMethod::parse(verb) {
                    routes.push(RouteMatch::new(method, path.trim(), line, snippet).guarded(guarded));
                    continue;
                }
            }
            if !pattern.as_str().starts_with('/') {
                continue;
            }

            // gorilla/mux `.Methods(...)` after the call.
            let open = whole.start() + whole.as_str().find('(').unwrap_or(0);
            let call_len = balanced_args(source, open).map(|a| a.len() + 2).unwrap_or(0);
            let tail = source.get(open + call_len..).unwrap_or("");
            let listed: Vec<HttpMethod> = tail
                .trim_start()
                .strip_prefix(".Methods")
                .and_then(|rest| {
                    let open = rest.find('(')?;
                    balanced_args(rest, open)
                })
                .map(|args| {
                    string_literals(args)
                        .iter()
                        .filter_map(|m| HttpMethod::parse(m))
                        .collect()
                })
                .unwrap_or_default();
            let methods = if listed.is_empty() {
                vec![HttpMethod::Get]
            } else {
                listed
            };
            for method in methods {
                routes.push(RouteMatch::new(method, pattern.as_str(), line, snippet).guarded(guarded));
            }
        }

        let unresolved = dynamic_call_re()
            .find_iter(source)
            .map(|found| UnresolvedRoute::new(line_of(source, found.start()), line_at(source, found.start())))
            .collect();

        routes.sort_by_key(|r| r.line);
        RouteScan { routes, unresolved }
    }
}
