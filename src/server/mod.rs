//! HTTP adapter: serves a [`Dispatcher`](crate::dispatcher::Dispatcher) over
//! `may_minihttp`.
//!
//! [`AppService`] parses each wire request into a
//! [`DispatchRequest`](crate::dispatcher::DispatchRequest), answers `GET /health`
//! itself and hands everything else to the dispatcher. [`HttpServer`] binds it to an
//! address and returns a [`ServerHandle`].

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, ParseError, DEFAULT_MAX_BODY_BYTES};
pub use response::{write_response, MAX_INTERNED_HEADERS};
pub use service::AppService;
