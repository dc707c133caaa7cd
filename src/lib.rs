//! # routewise
//!
//! **routewise** is a route matching and request dispatch engine. One pattern
//! compiler and one ordered route table serve two dispatch front ends:
//!
//! - a server-side [`Dispatcher`](dispatcher::Dispatcher) that turns a normalized
//!   request into exactly one response, running an ordered middleware pipeline around
//!   synchronous handlers on the `may` coroutine runtime
//! - a client-side [`Navigator`](navigation::Navigator) for single-page apps that
//!   dispatches on programmatic navigation, history traversal and link clicks, with
//!   suspendable handlers and guards
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Template compilation (`/orders/:id`, `/orders/{id}`) and
//!   parameter extraction
//! - **[`router`]** - Ordered route table, exact-path shortcut, first-match-wins scan
//! - **[`middleware`]** - Ordered pipeline plus built-in steps (metrics, tracing,
//!   session, CSRF)
//! - **[`dispatcher`]** - Server dispatch state machine, handler trait, request and
//!   response types
//! - **[`navigation`]** - Client navigator, history abstraction, link interception
//! - **[`server`]** - `may_minihttp` adapter and `/health`
//! - **[`config`]** / **[`logging`]** - YAML application config, runtime and log
//!   settings from the environment
//! - **[`cli`]** - The `routewise` binary
//!
//! ### Request Flow (server)
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::AppService
//!     participant Dispatcher
//!     participant Table as router::RouteTable
//!     participant Pipeline as middleware::Pipeline
//!     participant Handler
//!
//!     Client->>Server: HTTP Request
//!     Server->>Server: parse_request (method, target, headers, body)
//!     Server->>Dispatcher: dispatch(DispatchRequest)
//!     Dispatcher->>Table: route(method, path)
//!
//!     alt No Match
//!         Dispatcher-->>Client: 404 (or not-found hook)
//!     end
//!
//!     Dispatcher->>Pipeline: run(request, route skips)
//!
//!     alt Step Halts
//!         Pipeline-->>Client: halting step's response (401, 403, redirect)
//!     end
//!
//!     Dispatcher->>Handler: handle(request, params)
//!
//!     alt Error or Panic
//!         Handler-->>Dispatcher: fault
//!         Dispatcher-->>Client: 500 (or error hook)
//!     end
//!
//!     Handler-->>Dispatcher: HandlerOutput
//!     Dispatcher->>Pipeline: run_after(request, response, latency)
//!     Dispatcher-->>Client: response
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use routewise::dispatcher::{handler_fn, Dispatcher};
//! use routewise::middleware::TracingMiddleware;
//! use routewise::server::{AppService, HttpServer};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add_middleware(Arc::new(TracingMiddleware));
//! dispatcher
//!     .get("/orders/:id", handler_fn(|_req, params| {
//!         Ok(format!("order {}", params.get("id").unwrap_or_default()))
//!     }))
//!     .unwrap();
//!
//! let handle = HttpServer(AppService::new(Arc::new(dispatcher)))
//!     .start("127.0.0.1:8080")
//!     .unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Runtime Considerations
//!
//! The server side uses the `may` coroutine runtime, not tokio. Handlers are plain
//! synchronous functions running on coroutines; the stack size is configurable via
//! `ROUTEWISE_STACK_SIZE` (see [`config::RuntimeConfig`]). The client side is
//! single-threaded and executor-agnostic: the navigator spawns onto any
//! `futures::task::LocalSpawn`.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod navigation;
pub mod pattern;
pub mod router;
pub mod server;

pub use dispatcher::{DispatchRequest, DispatchResponse, Dispatcher, Handler, HandlerOutput};
pub use navigation::{MemoryHistory, Navigator};
pub use pattern::{compile, Params, PatternError, RoutePattern};
pub use router::{RouteError, RouteOptions, RouteTable};
