//! # JavaScript / TypeScript Matchers
//!
//! * [`ExpressMatcher`]: `app.get('/x', h)`, `router.post("/x", ...)` and
//!   `router.route('/x').get(h).put(h)` chains (Express, Koa router, Fastify).
//! * [`NestMatcher`]: `@Controller('users')` classes with `@Get(':id')` methods.

use crate::models::HttpMethod;
use crate::scanner::paths::join_paths;
use crate::strategies::text::{balanced_args, first_literal, line_at, line_of};
use crate::strategies::traits::{RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};
use regex::Regex;
use std::sync::OnceLock;

const JS_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx"];

/// Express style method calls on an app or router object.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressMatcher;

fn call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b([A-Za-z_$][\w$]*)\.(get|post|put|patch|delete|head|options)\s*\(\s*['"`](/[^'"`]*)['"`]"#)
            .expect("Invalid regex")
    })
}

/// A verb call on a router-like object whose first argument is an identifier.
fn dynamic_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(app|api|server|router|[A-Za-z_$][\w$]*Router)\.(?:get|post|put|patch|delete|head|options)\s*\(\s*[A-Za-z_$][\w$.]*\s*,")
            .expect("Invalid regex")
    })
}

fn route_chain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b[A-Za-z_$][\w$]*\.route\s*\(\s*['"`](/[^'"`]*)['"`]\s*\)"#)
            .expect("Invalid regex")
    })
}

fn chained_verb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\.(get|post|put|patch|delete|head|options)\s*\(").expect("Invalid regex")
    })
}

fn js_guard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b\w*(?:auth\w*|jwt\w*|requireUser|ensureLoggedIn|verifyToken|protect)\b")
            .expect("Invalid regex")
    })
}

/// Objects whose `.get("/...")` is an HTTP client call, not a registration.
const CLIENT_OBJECTS: &[&str] = &["axios", "fetch", "http", "https", "request", "superagent", "client", "$http"];

impl RouteMatcher for ExpressMatcher {
    fn name(&self) -> &'static str {
        "express"
    }

    fn extensions(&self) -> &'static [&'static str] {
        JS_EXTENSIONS
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let mut routes = Vec::new();
        let mut unresolved = Vec::new();

        for caps in call_re().captures_iter(source) {
            let (Some(whole), Some(object), Some(path)) = (caps.get(0), caps.get(1), caps.get(3))
            else {
                continue;
            };
            if CLIENT_OBJECTS.contains(&object.as_str()) {
                continue;
            }
            let Some(method) = HttpMethod::parse(&caps[2]) else {
                continue;
            };
            // Handlers after the path; a guard middleware is a name like `requireAuth`.
            let open = whole.start() + whole.as_str().find('(').unwrap_or(0);
            let args = balanced_args(source, open).unwrap_or("");
            let handlers = args.get(path.end() - open..).unwrap_or("");
            routes.push(
                RouteMatch::new(method, path.as_str(), line_of(source, whole.start()), line_at(source, whole.start()))
                    .guarded(js_guard_re().is_match(handlers)),
            );
        }

        for caps in route_chain_re().captures_iter(source) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let line = line_of(source, whole.start());
            let snippet = line_at(source, whole.start());
            let mut rest = &source[whole.end()..];
            while let Some(verb) = chained_verb_re().captures(rest) {
                let (Some(call), Some(name)) = (verb.get(0), verb.get(1)) else {
                    break;
                };
                let open = call.end() - 1;
                let Some(args) = balanced_args(rest, open) else {
                    break;
                };
                if let Some(method) = HttpMethod::parse(name.as_str()) {
                    routes.push(
                        RouteMatch::new(method, path.as_str(), line, snippet)
                            .guarded(js_guard_re().is_match(args)),
                    );
                }
                rest = &rest[open + args.len() + 2..];
            }
        }

        for found in dynamic_call_re().find_iter(source) {
            unresolved.push(UnresolvedRoute::new(
                line_of(source, found.start()),
                line_at(source, found.start()),
            ));
        }

        routes.sort_by_key(|r| r.line);
        RouteScan { routes, unresolved }
    }
}

/// NestJS controller decorators.
#[derive(Debug, Default, Clone, Copy)]
pub struct NestMatcher;

fn nest_decorator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@(Controller|Get|Post|Put|Patch|Delete|Head|Options)\s*\(")
            .expect("Invalid regex")
    })
}

fn nest_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?:public|private|protected)\s+)?(?:async\s+)?([A-Za-z_$][\w$]*)\s*\(")
            .expect("Invalid regex")
    })
}

/// Controller paths may be given as `'users'` or `{ path: 'users' }`.
fn nest_path(args: &str) -> String {
    first_literal(args).unwrap_or_default()
}

/// For the decorator on line `index`: whether its decorator stack carries
/// `@UseGuards`, and the first line after the stack.
fn decorator_block<'a>(lines: &[&'a str], index: usize) -> (bool, Option<&'a str>) {
    let is_decorator = |l: &str| l.trim_start().starts_with('@');
    let mut start = index;
    while start > 0 && is_decorator(lines[start - 1]) {
        start -= 1;
    }
    let mut end = index;
    while end + 1 < lines.len() && is_decorator(lines[end + 1]) {
        end += 1;
    }
    let guarded = lines
        .get(start..=end)
        .is_some_and(|block| block.iter().any(|l| l.contains("@UseGuards")));
    (guarded, lines.get(end + 1).copied())
}

impl RouteMatcher for NestMatcher {
    fn name(&self) -> &'static str {
        "nestjs"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "js"]
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let lines: Vec<&str> = source.lines().collect();
        let mut scan = RouteScan::default();
        let mut prefix = String::new();
        let mut class_guarded = false;

        for caps in nest_decorator_re().captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let args = balanced_args(source, whole.end() - 1).unwrap_or("");
            let line = line_of(source, whole.start());
            let (guarded, next_line) = decorator_block(&lines, line - 1);

            if &caps[1] == "Controller" {
                prefix = nest_path(args);
                class_guarded = guarded;
                continue;
            }
            let Some(method) = HttpMethod::parse(&caps[1]) else {
                continue;
            };
            // `@Get(ROUTES.detail)`: a path that is not written out.
            if !args.trim().is_empty() && first_literal(args).is_none() {
                scan.unresolved.push(UnresolvedRoute::new(line, line_at(source, whole.start())));
                continue;
            }
            let base = format!("/{}", prefix.trim_start_matches('/'));
            let handler = next_line
                .and_then(|l| nest_method_re().captures(l))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            scan.routes.push(
                RouteMatch::new(method, join_paths(&base, &nest_path(args)), line, line_at(source, whole.start()))
                    .with_handler(handler)
                    .guarded(class_guarded || guarded),
            );
        }
        scan
    }
}
