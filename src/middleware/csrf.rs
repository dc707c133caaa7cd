use http::Method;
use tracing::debug;

use super::{Middleware, Next};
use crate::dispatcher::{DispatchRequest, DispatchResponse};

/// Double-submit CSRF check.
///
/// State-changing requests (POST, PUT, DELETE) must echo the value of the CSRF cookie
/// in the CSRF header; anything else halts with 403. Safe methods pass untouched.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    cookie: String,
    header: String,
}

impl Default for CsrfGuard {
    fn default() -> Self {
        Self::new("csrf_token", "x-csrf-token")
    }
}

impl CsrfGuard {
    #[must_use]
    pub fn new(cookie: &str, header: &str) -> Self {
        Self {
            cookie: cookie.to_string(),
            header: header.to_ascii_lowercase(),
        }
    }

    fn is_state_changing(method: &Method) -> bool {
        matches!(*method, Method::POST | Method::PUT | Method::DELETE)
    }
}

impl Middleware for CsrfGuard {
    fn name(&self) -> &str {
        "csrf"
    }

    fn before(&self, req: DispatchRequest) -> anyhow::Result<Next> {
        if !Self::is_state_changing(req.method()) {
            return Ok(Next::Continue(req));
        }
        let expected = req.cookie(&self.cookie).filter(|v| !v.is_empty());
        let presented = req.header(&self.header);
        match (expected, presented) {
            (Some(expected), Some(presented)) if constant_time_eq(expected, presented) => {
                Ok(Next::Continue(req))
            }
            _ => {
                debug!(
                    request_id = %req.request_id(),
                    method = %req.method(),
                    path = %req.path(),
                    "CSRF token missing or mismatched"
                );
                Ok(Next::Halt(DispatchResponse::error(403, "Invalid CSRF token")))
            }
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
