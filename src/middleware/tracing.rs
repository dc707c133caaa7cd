use std::time::Duration;

use tracing::{debug, info, info_span};

use super::{Middleware, Next};
use crate::dispatcher::{DispatchRequest, DispatchResponse};

/// Logs each request as it enters the pipeline and records a `request` span with
/// the final status and latency once the handler has run.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn name(&self) -> &str {
        "tracing"
    }

    fn before(&self, req: DispatchRequest) -> anyhow::Result<Next> {
        debug!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %req.path(),
            "Request entering pipeline"
        );
        Ok(Next::Continue(req))
    }

    fn after(&self, req: &DispatchRequest, res: &mut DispatchResponse, latency: Duration) {
        let span = info_span!(
            "request",
            request_id = %req.request_id(),
            method = %req.method(),
            path = %req.path(),
            status = res.status,
            latency_ms = latency.as_millis() as u64,
        );
        span.in_scope(|| info!("Request completed"));
    }
}
