use super::request::{parse_request, DEFAULT_MAX_BODY_BYTES};
use super::response::write_response;
use crate::dispatcher::{DispatchResponse, Dispatcher};
use crate::middleware::MetricsMiddleware;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::Arc;
use tracing::warn;

/// `may_minihttp` service that hands every request to a shared [`Dispatcher`].
///
/// Cloned once per connection; all clones share the same dispatcher, which is
/// read-only while serving.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
    metrics: Option<Arc<MetricsMiddleware>>,
    max_body_bytes: usize,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            metrics: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Report these counters from `GET /health`
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsMiddleware>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Basic health check body: `{ "status": "ok" }` plus counters when available
    #[must_use]
    pub fn health(&self) -> DispatchResponse {
        let mut body = json!({ "status": "ok", "routes": self.dispatcher.routes().len() });
        if let Some(metrics) = &self.metrics {
            body["metrics"] = json!(metrics.snapshot());
        }
        DispatchResponse::json(200, body)
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = match parse_request(req, self.max_body_bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, status = e.status(), "Rejected malformed request");
                write_response(res, DispatchResponse::error(e.status(), &e.to_string()));
                return Ok(());
            }
        };

        if *parsed.method() == Method::GET && parsed.path() == "/health" {
            write_response(res, self.health());
            return Ok(());
        }

        let response = self.dispatcher.dispatch(parsed);
        write_response(res, response);
        Ok(())
    }
}
