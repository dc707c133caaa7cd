//! # Dispatcher Module
//!
//! The server-side driver of the routing engine. A [`Dispatcher`] owns a
//! [`RouteTable`](crate::router::RouteTable) of handlers and a middleware
//! [`Pipeline`](crate::middleware::Pipeline), and turns every [`DispatchRequest`] into
//! exactly one [`DispatchResponse`].
//!
//! ## Request Flow
//!
//! ```text
//! Received -> Matching -> (NotFound | Matched) -> MiddlewareRunning
//!          -> (Halted | Passed) -> HandlerRunning -> Responded
//! ```
//!
//! 1. The route table matches `(method, path)`; no match answers through the
//!    not-found hook, or a generic JSON 404 when none is set
//! 2. The pipeline runs every step the route does not skip; a halt returns the
//!    step's own response and the handler is never invoked
//! 3. The handler runs with the request and the bound path parameters
//! 4. Its return value is normalized through [`HandlerOutput`]: raw strings and JSON
//!    values get a 200 envelope, `()` becomes 204, a [`DispatchResponse`] passes
//!    through unchanged
//! 5. `after` hooks run for the steps that passed
//!
//! ## Error Handling
//!
//! The dispatcher is the fault boundary. Handler errors, handler panics and
//! middleware faults become a 500 response (or whatever the error hook returns).
//! Fault details are logged and only included in the body when
//! [`DispatcherConfig::expose_fault_details`] is set.
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use routewise::dispatcher::{handler_fn, DispatchRequest, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .get("/orders/:id", handler_fn(|_req, params| {
//!         Ok(serde_json::json!({ "id": params.get("id") }))
//!     }))
//!     .unwrap();
//!
//! let res = dispatcher.dispatch(DispatchRequest::new(Method::GET, "/orders/42"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["id"], "42");
//!
//! let res = dispatcher.dispatch(DispatchRequest::new(Method::DELETE, "/orders/42"));
//! assert_eq!(res.status, 404);
//! ```

mod core;
mod request;
mod response;

pub use core::{
    handler_fn, Dispatcher, DispatcherConfig, ErrorHook, Handler, NotFoundHook, Outcome,
};
pub use request::{DispatchRequest, HeaderVec, MAX_INLINE_HEADERS};
pub use response::{DispatchResponse, HandlerOutput};
