//! # Middleware Module
//!
//! An ordered, process-wide pipeline of named steps that run after a route matched and
//! before its handler. Each step receives the current [`DispatchRequest`] and either
//! continues with a (possibly rewritten) request or halts with its own response.
//!
//! - Steps run strictly in order and never concurrently for one request
//! - A halting or faulting step is the last one executed
//! - A route can opt out of steps by name through
//!   [`RouteOptions::skip`](crate::router::RouteOptions::skip)
//! - `after` hooks run for the steps that passed, once the handler has responded
//!
//! The same trait drives client navigation: every [`Middleware`] is also a
//! [`NavGuard`](crate::navigation::NavGuard).
//!
//! ## Built-in Steps
//!
//! | Step | Name | Halts with |
//! |------|------|------------|
//! | [`SessionGuard`] | `session` | 401, or a redirect to the login route |
//! | [`CsrfGuard`] | `csrf` | 403 |
//! | [`TracingMiddleware`] | `tracing` | never |
//! | [`MetricsMiddleware`] | `metrics` | never |
//!
//! [`DispatchRequest`]: crate::dispatcher::DispatchRequest

pub(crate) mod core;
mod csrf;
mod metrics;
mod session;
mod tracing;

pub use core::{Middleware, Next, Pipeline, PipelineOutcome};
pub use csrf::CsrfGuard;
pub use metrics::{MetricsMiddleware, MetricsSnapshot};
pub use session::{Rejection, SessionGuard, SUBJECT_ATTRIBUTE};
pub use tracing::TracingMiddleware;
