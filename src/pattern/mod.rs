//! # Pattern Module
//!
//! The pattern module compiles route templates such as `/orders/:id` or
//! `/customers/{id}/notes` into immutable [`RoutePattern`] values that can test a
//! candidate path and extract its named parameters.
//!
//! ## Template Syntax
//!
//! A template is a `/`-delimited string. Each segment is either:
//!
//! - a **literal** (`orders`), compared byte-for-byte and case-sensitively, or
//! - a **parameter**, written `:name` or `{name}`, which matches any non-empty
//!   segment and binds it to `name`.
//!
//! Segment count is fixed at compile time: a pattern only matches paths with exactly
//! the same number of segments. There are no wildcards and no optional segments.
//!
//! ## Trailing Slashes
//!
//! No normalization is performed. `/orders` and `/orders/` are distinct patterns: the
//! trailing slash produces an empty final segment, and an empty segment is only ever
//! matched by an empty literal segment. The root template `/` has zero segments.
//!
//! ## Errors
//!
//! Malformed templates (unbalanced `{`/`}`, empty or invalid parameter names, a
//! parameter mixed with literal text inside one segment, duplicate parameter names)
//! are rejected with a descriptive [`PatternError`]. They are never silently treated
//! as literal paths.
//!
//! ## Example
//!
//! ```rust
//! use routewise::pattern::compile;
//!
//! let pattern = compile("/orders/{id}/items/:item").unwrap();
//! let params = pattern.match_path("/orders/42/items/a%20b").unwrap();
//! assert_eq!(params.get("id"), Some("42"));
//! assert_eq!(params.get("item"), Some("a b"));
//! assert!(pattern.match_path("/orders/42").is_none());
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    compile, split_segments, ParamVec, Params, PatternError, RoutePattern, Segment,
    MAX_INLINE_PARAMS,
};
