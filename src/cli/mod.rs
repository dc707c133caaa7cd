//! # CLI Module
//!
//! Command-line front end for the `routewise` binary. A YAML file (see
//! [`crate::config`]) declares routes and the built-in guards; every route is served
//! by [`crate::echo::echo_handler`], which makes the binary a convenient way to try
//! route tables and guard settings against real HTTP clients.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! routewise serve --config routewise.yaml --addr 127.0.0.1:8080
//! ```
//!
//! ### `routes`
//!
//! Print the route table in registration order:
//!
//! ```bash
//! routewise routes --config routewise.yaml
//! ```
//!
//! ### `match`
//!
//! Show which route a request would reach, and its captured parameters:
//!
//! ```bash
//! routewise match --config routewise.yaml GET /orders/42
//! ```

mod commands;

pub use commands::{build_dispatcher, match_report, run, run_cli, Cli, Commands};
