#![deny(missing_docs)]

//! # Strategies
//!
//! Pluggable route discovery for the source scanner. Each matcher recognizes
//! one family of registration idioms; adding an idiom means adding a
//! matcher, never touching the traversal.
//!
//! - **traits**: Defines `RouteMatcher` and `RouteMatch`.
//! - **python**, **javascript**, **rust**, **go**, **spring**: the built-in matchers.
//! - **text**: lexical helpers shared by the regex based matchers.

pub mod go;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod spring;
pub mod text;
pub mod traits;

// Re-export for easier access downstream
pub use go::GoRouterMatcher;
pub use javascript::{ExpressMatcher, NestMatcher};
pub use python::PythonDecoratorMatcher;
pub use rust::{AxumRouteMatcher, RustAttributeMatcher};
pub use spring::SpringMappingMatcher;
pub use traits::{RouteMatch, RouteMatcher, RouteScan, UnresolvedRoute};

/// Every built-in matcher.
pub fn default_matchers() -> Vec<Box<dyn RouteMatcher>> {
    vec![
        Box::new(PythonDecoratorMatcher),
        Box::new(ExpressMatcher),
        Box::new(NestMatcher),
        Box::new(RustAttributeMatcher),
        Box::new(AxumRouteMatcher),
        Box::new(GoRouterMatcher),
        Box::new(SpringMappingMatcher),
    ]
}
