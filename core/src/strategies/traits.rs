#![deny(missing_docs)]

//! # Route Matcher Trait
//!
//! Defines the interface a route registration idiom (FastAPI decorators,
//! Express calls, Spring annotations, ...) implements so the scanner can
//! discover endpoints without knowing the framework.

use crate::models::HttpMethod;

/// One route registration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Bound HTTP verb.
    pub method: HttpMethod,
    /// Path as written in the source, prefixes already applied.
    pub path: String,
    /// 1-based line of the registration.
    pub line: usize,
    /// The registration line, trimmed.
    pub snippet: String,
    /// Handler function name, when the idiom names one.
    pub handler: Option<String>,
    /// Whether an authentication guard was detected on the handler.
    pub authenticated: bool,
}

impl RouteMatch {
    /// A match without handler or auth hints.
    pub fn new(method: HttpMethod, path: impl Into<String>, line: usize, snippet: &str) -> Self {
        Self {
            method,
            path: path.into(),
            line,
            snippet: snippet.to_string(),
            handler: None,
            authenticated: false,
        }
    }

    /// Sets the handler name.
    pub fn with_handler(mut self, handler: Option<String>) -> Self {
        self.handler = handler;
        self
    }

    /// Marks the route as guarded.
    pub fn guarded(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }
}

/// A registration the matcher recognized but could not turn into a route,
/// typically because the path is a constant or an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRoute {
    /// 1-based line of the registration.
    pub line: usize,
    /// The registration line, trimmed.
    pub snippet: String,
}

impl UnresolvedRoute {
    /// An unresolved site at `line`.
    pub fn new(line: usize, snippet: &str) -> Self {
        Self {
            line,
            snippet: snippet.to_string(),
        }
    }
}

/// Everything one matcher found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteScan {
    /// Resolved registrations, in source order.
    pub routes: Vec<RouteMatch>,
    /// Registrations whose path could not be read.
    pub unresolved: Vec<UnresolvedRoute>,
}

/// A strategy for recognizing one family of route registration syntax.
///
/// Implementors must be stateless: the scanner shares one instance across
/// worker threads.
pub trait RouteMatcher: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// File extensions (without dot) this matcher understands.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether the matcher should run on a file with this extension.
    fn applies_to(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
    }

    /// Finds every registration in `source`, in source order.
    ///
    /// Never fails: text the matcher does not understand yields no matches.
    /// A registration it does understand but cannot resolve lands in
    /// [`RouteScan::unresolved`] so the caller can report it.
    fn scan_source(&self, source: &str) -> RouteScan;

    /// The resolved routes of [`RouteMatcher::scan_source`].
    fn find_routes(&self, source: &str) -> Vec<RouteMatch> {
        self.scan_source(source).routes
    }
}
