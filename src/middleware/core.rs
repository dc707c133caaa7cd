use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::dispatcher::{DispatchRequest, DispatchResponse};

/// Decision returned by a middleware step.
#[derive(Debug)]
pub enum Next {
    /// Continue with this (possibly rewritten) request
    Continue(DispatchRequest),
    /// Short-circuit dispatch with this response; the handler never runs
    Halt(DispatchResponse),
}

/// A named step in the request pipeline.
///
/// `before` runs in registration order ahead of the handler. Returning
/// [`Next::Halt`] stops the chain; returning `Err` (or panicking) is an unexpected
/// fault that the dispatcher turns into a server error. `after` runs only for steps
/// whose `before` passed, once the handler has produced a response.
pub trait Middleware: Send + Sync {
    /// Name used for per-route exemptions and in logs
    fn name(&self) -> &str;

    fn before(&self, req: DispatchRequest) -> anyhow::Result<Next> {
        Ok(Next::Continue(req))
    }

    fn after(&self, _req: &DispatchRequest, _res: &mut DispatchResponse, _latency: Duration) {}
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn before(&self, req: DispatchRequest) -> anyhow::Result<Next> {
        (**self).before(req)
    }

    fn after(&self, req: &DispatchRequest, res: &mut DispatchResponse, latency: Duration) {
        (**self).after(req, res, latency);
    }
}

/// Result of running the pipeline for one request.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every step passed; carries the final request version
    Passed(DispatchRequest),
    /// A step halted dispatch
    Halted {
        step: String,
        response: DispatchResponse,
    },
    /// A step failed unexpectedly
    Faulted {
        step: String,
        error: anyhow::Error,
        /// Id, method and path of the faulted request; headers and body are not kept
        request: DispatchRequest,
    },
}

/// Ordered, process-wide middleware chain.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; steps run in the order they are added
    pub fn push(&mut self, step: Arc<dyn Middleware>) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step not listed in `skip`, strictly in order.
    ///
    /// A halting or faulting step is the last one executed.
    pub fn run(&self, req: DispatchRequest, skip: &[String]) -> PipelineOutcome {
        let request_id = req.request_id();
        let method = req.method().clone();
        let path = req.path().to_string();
        let mut current = req;

        for step in self.active(skip) {
            let name = step.name();
            let result = catch_unwind(AssertUnwindSafe(|| step.before(current)));
            match result {
                Ok(Ok(Next::Continue(next))) => current = next,
                Ok(Ok(Next::Halt(response))) => {
                    // M1: Middleware halted dispatch
                    debug!(
                        request_id = %request_id,
                        middleware = %name,
                        status = response.status,
                        "Middleware halted dispatch"
                    );
                    return PipelineOutcome::Halted {
                        step: name.to_string(),
                        response,
                    };
                }
                Ok(Err(error)) => {
                    // M2: Middleware fault
                    warn!(
                        request_id = %request_id,
                        middleware = %name,
                        error = %error,
                        "Middleware failed"
                    );
                    return PipelineOutcome::Faulted {
                        step: name.to_string(),
                        error,
                        request: DispatchRequest::new(method, path).with_request_id(request_id),
                    };
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(
                        request_id = %request_id,
                        middleware = %name,
                        panic_message = %message,
                        "Middleware panicked"
                    );
                    return PipelineOutcome::Faulted {
                        step: name.to_string(),
                        error: anyhow::anyhow!("middleware '{name}' panicked: {message}"),
                        request: DispatchRequest::new(method, path).with_request_id(request_id),
                    };
                }
            }
        }

        PipelineOutcome::Passed(current)
    }

    /// Run `after` hooks of every step not listed in `skip`.
    pub fn run_after(
        &self,
        req: &DispatchRequest,
        res: &mut DispatchResponse,
        latency: Duration,
        skip: &[String],
    ) {
        for step in self.active(skip) {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| step.after(req, res, latency))) {
                error!(
                    request_id = %req.request_id(),
                    middleware = %step.name(),
                    panic_message = %panic_message(panic.as_ref()),
                    "Middleware after hook panicked"
                );
            }
        }
    }

    fn active<'a>(&'a self, skip: &'a [String]) -> impl Iterator<Item = &'a Arc<dyn Middleware>> {
        self.steps
            .iter()
            .filter(move |s| !skip.iter().any(|name| name == s.name()))
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
