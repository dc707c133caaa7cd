//! Dispatcher core module - hot path for request dispatch.

use super::request::DispatchRequest;
use super::response::{DispatchResponse, HandlerOutput};
use crate::middleware::core::panic_message;
use crate::middleware::{Middleware, Pipeline, PipelineOutcome};
use crate::pattern::Params;
use crate::router::{RouteError, RouteOptions, RouteTable};
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A route handler.
///
/// Implemented for every `Fn(&DispatchRequest, &Params) -> anyhow::Result<R>` where
/// `R: Into<HandlerOutput>`; use [`handler_fn`] to get closure parameter types
/// inferred.
pub trait Handler: Send + Sync {
    /// Handle a matched request.
    ///
    /// # Errors
    ///
    /// Any error is an unexpected fault and becomes a server-error response.
    fn handle(&self, req: &DispatchRequest, params: &Params) -> anyhow::Result<HandlerOutput>;
}

impl<F, R> Handler for F
where
    F: Fn(&DispatchRequest, &Params) -> anyhow::Result<R> + Send + Sync,
    R: Into<HandlerOutput>,
{
    fn handle(&self, req: &DispatchRequest, params: &Params) -> anyhow::Result<HandlerOutput> {
        (self)(req, params).map(Into::into)
    }
}

/// Identity helper that pins a closure to the handler signature.
///
/// ```
/// use routewise::dispatcher::handler_fn;
///
/// let show = handler_fn(|_req, params| Ok(format!("order {}", params.get("id").unwrap_or("?"))));
/// # let _ = show;
/// ```
pub fn handler_fn<F, R>(f: F) -> F
where
    F: Fn(&DispatchRequest, &Params) -> anyhow::Result<R> + Send + Sync,
    R: Into<HandlerOutput>,
{
    f
}

/// Fallback for requests no route matched
pub type NotFoundHook = dyn Fn(&DispatchRequest) -> DispatchResponse + Send + Sync;

/// Converts an unexpected fault into a response
pub type ErrorHook = dyn Fn(&DispatchRequest, &anyhow::Error) -> DispatchResponse + Send + Sync;

/// Dispatcher behavior switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Include fault messages in 500 bodies. Development only.
    #[serde(default)]
    pub expose_fault_details: bool,
}

/// How a single dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No route matched; the not-found hook or the generic 404 answered
    NotFound,
    /// A middleware step short-circuited with its own response
    Halted { step: String },
    /// The handler ran and produced the response
    Handled { route: String },
    /// A middleware step or the handler failed unexpectedly
    Faulted { route: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NotFound => f.write_str("not_found"),
            Outcome::Halted { step } => write!(f, "halted by {step}"),
            Outcome::Handled { route } => write!(f, "handled by {route}"),
            Outcome::Faulted { route } => write!(f, "faulted in {route}"),
        }
    }
}

/// Server-side dispatcher: route table, middleware pipeline and fault boundary.
///
/// Configuration happens through `&mut self` before traffic starts; dispatch only
/// needs `&self`, so one dispatcher behind an `Arc` serves any number of concurrent
/// requests without locking.
#[derive(Default)]
pub struct Dispatcher {
    table: RouteTable<Arc<dyn Handler>>,
    pipeline: Pipeline,
    not_found: Option<Arc<NotFoundHook>>,
    on_error: Option<Arc<ErrorHook>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Register a handler for `method` and `template`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for unsupported methods and malformed templates.
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        self.register_with(method, template, RouteOptions::default(), handler)
    }

    /// Register a handler with a route name and middleware exemptions.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for unsupported methods and malformed templates.
    pub fn register_with(
        &mut self,
        method: Method,
        template: &str,
        options: RouteOptions,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        self.table.register_with(method, template, options, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn get(&mut self, template: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.register(Method::GET, template, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn post(&mut self, template: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.register(Method::POST, template, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn put(&mut self, template: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.register(Method::PUT, template, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn delete(&mut self, template: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.register(Method::DELETE, template, handler)
    }

    /// Append a middleware step to the pipeline
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        debug!(middleware = %mw.name(), position = self.pipeline.len(), "Middleware added");
        self.pipeline.push(mw);
    }

    /// Answer unmatched requests with `hook` instead of the generic 404
    pub fn set_not_found<F>(&mut self, hook: F)
    where
        F: Fn(&DispatchRequest) -> DispatchResponse + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(hook));
    }

    /// Convert faults with `hook` instead of the generic 500
    pub fn set_error_handler<F>(&mut self, hook: F)
    where
        F: Fn(&DispatchRequest, &anyhow::Error) -> DispatchResponse + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable<Arc<dyn Handler>> {
        &self.table
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Dispatch a request and return its single response.
    #[must_use]
    pub fn dispatch(&self, req: DispatchRequest) -> DispatchResponse {
        self.dispatch_with_outcome(req).0
    }

    /// Dispatch a request and report how it ended.
    ///
    /// Never panics and never returns an error: unmatched routes, halts and faults
    /// all become a response.
    #[must_use]
    pub fn dispatch_with_outcome(&self, req: DispatchRequest) -> (DispatchResponse, Outcome) {
        let start = Instant::now();
        let request_id = req.request_id();

        // D1: Route lookup
        let Some(matched) = self.table.route(req.method(), req.path()) else {
            let response = self.not_found_response(&req);
            info!(
                request_id = %request_id,
                method = %req.method(),
                path = %req.path(),
                status = response.status,
                "Dispatch finished without a route"
            );
            return (response, Outcome::NotFound);
        };
        let route = matched.route;
        let params = matched.params;
        let label = route.label().to_string();
        let skip = &route.options().skip_middleware;

        // D2: Middleware before execution
        let req = match self.pipeline.run(req, skip) {
            PipelineOutcome::Passed(req) => req,
            PipelineOutcome::Halted { step, response } => {
                info!(
                    request_id = %request_id,
                    route = %label,
                    middleware = %step,
                    status = response.status,
                    "Dispatch halted by middleware"
                );
                return (response, Outcome::Halted { step });
            }
            PipelineOutcome::Faulted {
                step,
                error,
                request,
            } => {
                error!(
                    request_id = %request_id,
                    route = %label,
                    middleware = %step,
                    error = %error,
                    "Middleware fault converted to server error"
                );
                let response = self.fault_response(&request, &error);
                return (response, Outcome::Faulted { route: label });
            }
        };

        // D3: Handler invocation
        debug!(
            request_id = %request_id,
            route = %label,
            params = params.len(),
            "Invoking handler"
        );
        let handler = route.handler();
        let result = catch_unwind(AssertUnwindSafe(|| handler.handle(&req, &params)));
        let handler_latency = start.elapsed();

        let (mut response, outcome) = match result {
            Ok(Ok(output)) => (output.into_response(), Outcome::Handled { route: label }),
            Ok(Err(e)) => {
                // D4: Handler fault
                error!(
                    request_id = %request_id,
                    route = %label,
                    error = %e,
                    "Handler failed"
                );
                (self.fault_response(&req, &e), Outcome::Faulted { route: label })
            }
            Err(panic) => {
                // D5: Handler panic
                let message = panic_message(panic.as_ref());
                error!(
                    request_id = %request_id,
                    route = %label,
                    panic_message = %message,
                    "Handler panicked"
                );
                let e = anyhow::anyhow!("handler panicked: {message}");
                (self.fault_response(&req, &e), Outcome::Faulted { route: label })
            }
        };

        // D6: Middleware after execution
        self.pipeline
            .run_after(&req, &mut response, handler_latency, skip);

        // D7: Dispatch complete
        let total: Duration = start.elapsed();
        info!(
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
            status = response.status,
            outcome = %outcome,
            latency_ms = total.as_millis() as u64,
            "Dispatch complete"
        );
        (response, outcome)
    }

    fn not_found_response(&self, req: &DispatchRequest) -> DispatchResponse {
        let Some(hook) = &self.not_found else {
            return DispatchResponse::not_found(req.method().as_str(), req.path());
        };
        match catch_unwind(AssertUnwindSafe(|| hook(req))) {
            Ok(response) => response,
            Err(panic) => {
                let e = anyhow::anyhow!("not-found hook panicked: {}", panic_message(panic.as_ref()));
                warn!(request_id = %req.request_id(), error = %e, "Not-found hook failed");
                self.fault_response(req, &e)
            }
        }
    }

    fn fault_response(&self, req: &DispatchRequest, fault: &anyhow::Error) -> DispatchResponse {
        if let Some(hook) = &self.on_error {
            match catch_unwind(AssertUnwindSafe(|| hook(req, fault))) {
                Ok(response) => return response,
                Err(panic) => error!(
                    request_id = %req.request_id(),
                    panic_message = %panic_message(panic.as_ref()),
                    "Error hook panicked; using generic server error"
                ),
            }
        }
        if self.config.expose_fault_details {
            DispatchResponse::json(
                500,
                serde_json::json!({
                    "error": "Internal Server Error",
                    "detail": format!("{fault:#}"),
                }),
            )
        } else {
            DispatchResponse::internal_error()
        }
    }
}
