//! # Router Module
//!
//! The router module holds the ordered route table shared by the server-side
//! [`Dispatcher`](crate::dispatcher::Dispatcher) and the client-side
//! [`Navigator`](crate::navigation::Navigator).
//!
//! ## Overview
//!
//! A [`RouteTable`] is an ordered sequence of `(method, pattern, handler, options)`
//! entries. It is generic over the handler type so both variants run exactly the same
//! matching algorithm and cannot drift apart.
//!
//! ## Matching
//!
//! 1. **Exact shortcut**: a literal route whose template equals the request path is
//!    returned immediately with empty params.
//! 2. **Ordered scan**: routes registered for the method are tested in registration
//!    order. Segment counts must agree, literals compare byte-for-byte, parameters
//!    match any non-empty segment.
//! 3. **First match wins.** There is no specificity ranking.
//!
//! The shortcut never changes the answer of the ordered scan: a literal route that an
//! earlier route already matches is *shadowed* and is left out of the exact index (a
//! warning is logged at registration).
//!
//! ## Registration Order Matters
//!
//! Register literal routes before parameterized routes that could also match them:
//!
//! ```rust
//! use http::Method;
//! use routewise::router::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.register(Method::GET, "/orders/new", "new_order_form").unwrap();
//! table.register(Method::GET, "/orders/:id", "show_order").unwrap();
//!
//! let m = table.route(&Method::GET, "/orders/new").unwrap();
//! assert_eq!(*m.route.handler(), "new_order_form");
//! assert!(m.params.is_empty());
//!
//! let m = table.route(&Method::GET, "/orders/42").unwrap();
//! assert_eq!(*m.route.handler(), "show_order");
//! assert_eq!(m.params.get("id"), Some("42"));
//! ```
//!
//! Registered the other way round, `/orders/:id` claims `/orders/new` with
//! `id = "new"`.
//!
//! Query strings and fragments must be stripped by the caller before matching.

mod core;
#[cfg(test)]
mod tests;

pub use core::{Route, RouteError, RouteMatch, RouteOptions, RouteTable, SUPPORTED_METHODS};
