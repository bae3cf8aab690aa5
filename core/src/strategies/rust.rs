//! # Rust Matchers
//!
//! Structural matching over the `ra_ap_syntax` tree:
//!
//! * [`RustAttributeMatcher`]: `#[get("/x")]`, `#[actix_web::post("/x")]`,
//!   `#[route("/x", method = "GET", method = "HEAD")]` (Actix, Rocket, Poem).
//! * [`AxumRouteMatcher`]: `.route("/x", get(list).post(create))` chains.
//!
//! Handlers whose parameter list mentions an auth extractor (`Claims`,
//! `AuthUser`, `BearerAuth`, ...) are marked as guarded.

use crate::models::HttpMethod;
use crate::strategies::text::{first_literal, line_at, line_of};
use crate::strategies::traits::{RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};
use ra_ap_edition::Edition;
use ra_ap_syntax::ast::{self, HasArgList, HasName};
use ra_ap_syntax::{AstNode, SourceFile, SyntaxNode};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Verb attribute macros on handler functions.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustAttributeMatcher;

/// Axum `Router::route` registrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxumRouteMatcher;

fn auth_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:\w*auth\w*|claims|\w*bearer\w*|identity|current_?user|jwt\w*)\b")
            .expect("Invalid regex")
    })
}

fn route_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bmethod\s*=\s*"(\w+)""#).expect("Invalid regex"))
}

fn axum_verb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[^\w])(get|post|put|patch|delete|head|options|trace)(?:_service)?\s*\(\s*([A-Za-z_][\w:]*)?",
        )
        .expect("Invalid regex")
    })
}

fn offset(node: &SyntaxNode) -> usize {
    usize::from(node.text_range().start())
}

/// `handler name -> guarded` for every fn in the file.
fn guarded_handlers(file: &SourceFile) -> HashMap<String, bool> {
    file.syntax()
        .descendants()
        .filter_map(ast::Fn::cast)
        .filter_map(|func| {
            let name = func.name()?.text().to_string();
            Some((name, fn_is_guarded(&func)))
        })
        .collect()
}

fn fn_is_guarded(func: &ast::Fn) -> bool {
    func.param_list()
        .is_some_and(|params| auth_param_re().is_match(&params.syntax().text().to_string()))
}

impl RouteMatcher for RustAttributeMatcher {
    fn name(&self) -> &'static str {
        "rust-attributes"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let parse = SourceFile::parse(source, Edition::Edition2021);
        let file = parse.tree();
        let mut scan = RouteScan::default();

        for func in file.syntax().descendants().filter_map(ast::Fn::cast) {
            let handler = func.name().map(|n| n.text().to_string());
            let guarded = fn_is_guarded(&func);

            for attr in func.syntax().children().filter_map(ast::Attr::cast) {
                let Some(meta) = attr.meta() else {
                    continue;
                };
                let Some(path) = meta.path() else {
                    continue;
                };
                let ident = path.to_string();
                let macro_name = ident.rsplit("::").next().unwrap_or(&ident).to_string();
                let args = meta
                    .token_tree()
                    .map(|tt| tt.syntax().text().to_string())
                    .unwrap_or_default();

                let methods: Vec<HttpMethod> = match macro_name.as_str() {
                    "route" => route_method_re()
                        .captures_iter(&args)
                        .filter_map(|c| HttpMethod::parse(&c[1]))
                        .collect(),
                    "get" | "post" | "put" | "patch" | "delete" | "head" | "options" | "trace" => {
                        HttpMethod::parse(&macro_name).into_iter().collect()
                    }
                    _ => continue,
                };
                let at = offset(attr.syntax());
                let Some(route_path) = first_literal(&args) else {
                    scan.unresolved.push(UnresolvedRoute::new(line_of(source, at), line_at(source, at)));
                    continue;
                };
                if !route_path.starts_with('/') {
                    continue;
                }
                for method in methods {
                    scan.routes.push(
                        RouteMatch::new(method, route_path.clone(), line_of(source, at), line_at(source, at))
                            .with_handler(handler.clone())
                            .guarded(guarded),
                    );
                }
            }
        }
        scan
    }
}

impl RouteMatcher for AxumRouteMatcher {
    fn name(&self) -> &'static str {
        "axum"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let parse = SourceFile::parse(source, Edition::Edition2021);
        let file = parse.tree();
        let guards = guarded_handlers(&file);
        let mut found: Vec<(usize, RouteMatch)> = Vec::new();
        let mut unresolved = Vec::new();

        for call in file.syntax().descendants().filter_map(ast::MethodCallExpr::cast) {
            if !call.name_ref().is_some_and(|n| n.text() == "route") {
                continue;
            }
            let Some(arg_list) = call.arg_list() else {
                continue;
            };
            let mut args = arg_list.args();
            let (Some(path_expr), Some(method_router)) = (args.next(), args.next()) else {
                continue;
            };
            let at = offset(path_expr.syntax());
            let router_text = method_router.syntax().text().to_string();
            let literal = match path_expr {
                ast::Expr::Literal(_) => first_literal(&path_expr.syntax().text().to_string()),
                _ => None,
            };
            let Some(route_path) = literal else {
                // `.route(USERS, get(list))`
                if axum_verb_re().is_match(&router_text) {
                    unresolved.push(UnresolvedRoute::new(line_of(source, at), line_at(source, at)));
                }
                continue;
            };

            for caps in axum_verb_re().captures_iter(&router_text) {
                let Some(method) = HttpMethod::parse(&caps[1]) else {
                    continue;
                };
                let handler = caps
                    .get(2)
                    .map(|m| m.as_str().rsplit("::").next().unwrap_or_default().to_string());
                let guarded = handler
                    .as_ref()
                    .and_then(|h| guards.get(h))
                    .copied()
                    .unwrap_or(false);
                found.push((
                    at,
                    RouteMatch::new(method, route_path.clone(), line_of(source, at), line_at(source, at))
                        .with_handler(handler)
                        .guarded(guarded),
                ));
            }
        }

        // Preorder visits outer calls of a chain first.
        found.sort_by_key(|(at, _)| *at);
        unresolved.sort_by_key(|u: &UnresolvedRoute| u.line);
        RouteScan {
            routes: found.into_iter().map(|(_, route)| route).collect(),
            unresolved,
        }
    }
}
