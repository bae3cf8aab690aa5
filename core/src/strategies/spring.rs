//! # Spring Matcher
//!
//! `@GetMapping("/x")`-style method annotations and
//! `@RequestMapping(value = "/x", method = RequestMethod.POST)` in Java and
//! Kotlin sources. A `@RequestMapping` directly on a class sets the prefix
//! for the methods that follow it.

use crate::models::HttpMethod;
use crate::scanner::paths::join_paths;
use crate::strategies::text::{balanced_args, first_literal, line_at, line_of};
use crate::strategies::traits::{RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};
use regex::Regex;
use std::sync::OnceLock;

/// Spring MVC / WebFlux mapping annotations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpringMappingMatcher;

fn mapping_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@(Get|Post|Put|Patch|Delete|Request)Mapping\b").expect("Invalid regex")
    })
}

fn request_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"RequestMethod\.(\w+)").expect("Invalid regex"))
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:class|interface|object)\s+\w+").expect("Invalid regex"))
}

fn method_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\bfun\s+|\s)(\w+)\s*\(").expect("Invalid regex"))
}

const GUARD_ANNOTATIONS: &[&str] = &["@PreAuthorize", "@Secured", "@RolesAllowed"];

impl RouteMatcher for SpringMappingMatcher {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java", "kt"]
    }

    fn scan_source(&self, source: &str) -> RouteScan {
        let lines: Vec<&str> = source.lines().collect();
        let mut scan = RouteScan::default();
        let mut prefix = String::new();
        let mut class_guarded = false;

        for caps in mapping_re().captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let args = match source[whole.end()..].starts_with('(') {
                true => balanced_args(source, whole.end()).unwrap_or(""),
                false => "",
            };
            let line = line_of(source, whole.start());
            let (block, target) = annotation_block(&lines, line - 1);
            let guarded = GUARD_ANNOTATIONS.iter().any(|g| block.contains(g));
            let path = first_literal(args).unwrap_or_default();

            if target.is_some_and(|t| class_re().is_match(t)) {
                prefix = path;
                class_guarded = guarded;
                continue;
            }
            // `@GetMapping(Paths.USERS)`: attributes like `method = ...` aside,
            // the path is a constant.
            if !args.trim().is_empty() && first_literal(args).is_none() && !args.contains('=') {
                scan.unresolved.push(UnresolvedRoute::new(line, line_at(source, whole.start())));
                continue;
            }

            let methods: Vec<HttpMethod> = match &caps[1] {
                "Request" => {
                    let listed: Vec<HttpMethod> = request_method_re()
                        .captures_iter(args)
                        .filter_map(|c| HttpMethod::parse(&c[1]))
                        .collect();
                    if listed.is_empty() {
                        vec![HttpMethod::Get]
                    } else {
                        listed
                    }
                }
                verb => HttpMethod::parse(verb).into_iter().collect(),
            };
            let handler = target
                .and_then(|t| method_name_re().captures(t))
                .map(|c| c[1].to_string());
            let full = join_paths(&prefix, &path);
            let snippet = line_at(source, whole.start());
            for method in methods {
                scan.routes.push(
                    RouteMatch::new(method, full.clone(), line, snippet)
                        .with_handler(handler.clone())
                        .guarded(class_guarded || guarded),
                );
            }
        }
        scan
    }
}

/// The annotation lines around `index` joined, and the declaration line that
/// follows them.
fn annotation_block<'a>(lines: &[&'a str], index: usize) -> (String, Option<&'a str>) {
    let is_annotation = |l: &str| l.trim_start().starts_with('@');
    let mut start = index;
    while start > 0 && is_annotation(lines[start - 1]) {
        start -= 1;
    }
    let mut end = index;
    while end + 1 < lines.len() && is_annotation(lines[end + 1]) {
        end += 1;
    }
    let block = lines.get(start..=end).map(|b| b.join("\n")).unwrap_or_default();
    // The annotation may share its line with the declaration.
    let same_line = lines
        .get(end)
        .filter(|l| class_re().is_match(l) || l.contains('('));
    let target = match lines.get(end + 1) {
        Some(next) => Some(*next),
        None => same_line.copied(),
    };
    (block, target)
}
