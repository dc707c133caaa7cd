use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{Middleware, Next};
use crate::dispatcher::{DispatchRequest, DispatchResponse};

/// Attribute holding the subject a verified session belongs to
pub const SUBJECT_ATTRIBUTE: &str = "session.subject";

type Verifier = dyn Fn(&str) -> Option<String> + Send + Sync;

/// What an unauthenticated request gets back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// `401 {"error": "Unauthorized"}`
    Unauthorized,
    /// `302` to the given location (typically the login route)
    RedirectTo(String),
}

/// Halts requests without a valid session token.
///
/// The token is read from a header (default `authorization`, with an optional
/// `Bearer ` prefix) and then from a cookie (default `session`). Token issuance and
/// validation live outside the router: the verifier is a pass/fail decision that
/// returns the subject for a valid token. On success the subject is recorded under
/// [`SUBJECT_ATTRIBUTE`] for later steps and the handler.
pub struct SessionGuard {
    header: String,
    cookie: Option<String>,
    verifier: Arc<Verifier>,
    rejection: Rejection,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("header", &self.header)
            .field("cookie", &self.cookie)
            .field("rejection", &self.rejection)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    pub fn new<F>(verifier: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            header: "authorization".to_string(),
            cookie: Some("session".to_string()),
            verifier: Arc::new(verifier),
            rejection: Rejection::Unauthorized,
        }
    }

    /// Accept a fixed token → subject table
    #[must_use]
    pub fn with_tokens(tokens: HashMap<String, String>) -> Self {
        Self::new(move |token| tokens.get(token).cloned())
    }

    #[must_use]
    pub fn header(mut self, name: &str) -> Self {
        self.header = name.to_ascii_lowercase();
        self
    }

    /// Cookie to fall back to; `None` disables the cookie lookup
    #[must_use]
    pub fn cookie(mut self, name: Option<&str>) -> Self {
        self.cookie = name.map(str::to_string);
        self
    }

    /// Redirect rejected requests instead of answering 401
    #[must_use]
    pub fn redirect_to(mut self, location: &str) -> Self {
        self.rejection = Rejection::RedirectTo(location.to_string());
        self
    }

    fn token<'a>(&self, req: &'a DispatchRequest) -> Option<&'a str> {
        let from_header = req.header(&self.header).map(|v| {
            let v = v.trim();
            v.strip_prefix("Bearer ").unwrap_or(v).trim()
        });
        from_header
            .filter(|t| !t.is_empty())
            .or_else(|| self.cookie.as_deref().and_then(|c| req.cookie(c)))
            .filter(|t| !t.is_empty())
    }

    fn reject(&self) -> DispatchResponse {
        match &self.rejection {
            Rejection::Unauthorized => DispatchResponse::error(401, "Unauthorized"),
            Rejection::RedirectTo(location) => DispatchResponse::redirect(location),
        }
    }
}

impl Middleware for SessionGuard {
    fn name(&self) -> &str {
        "session"
    }

    fn before(&self, req: DispatchRequest) -> anyhow::Result<Next> {
        let subject = self.token(&req).and_then(|token| (self.verifier)(token));
        match subject {
            Some(subject) => Ok(Next::Continue(req.with_attribute(SUBJECT_ATTRIBUTE, subject))),
            None => {
                debug!(
                    request_id = %req.request_id(),
                    path = %req.path(),
                    "Session missing or rejected"
                );
                Ok(Next::Halt(self.reject()))
            }
        }
    }
}
