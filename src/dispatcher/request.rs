use crate::ids::RequestId;
use crate::pattern::ParamVec;
use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers/attributes before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` (often repeated, O(1) clone); values remain `String`
/// as they're per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A normalized inbound request.
///
/// Immutable once constructed: the `with_*` builders consume the request and return
/// a new version, so a middleware step that rewrites the request never aliases the
/// version an earlier step saw.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    request_id: RequestId,
    method: Method,
    path: String,
    query: ParamVec,
    /// Lowercase names
    headers: HeaderVec,
    body: Arc<[u8]>,
    /// Values derived by middleware (e.g. the authenticated subject)
    attributes: HeaderVec,
}

impl DispatchRequest {
    /// Create a request for an already-stripped path (no query string or fragment).
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            query: ParamVec::new(),
            headers: HeaderVec::new(),
            body: Arc::from(Vec::new()),
            attributes: HeaderVec::new(),
        }
    }

    /// Create a request from a request target such as `/orders?page=2#top`.
    ///
    /// The fragment is dropped and the query string is parsed into query parameters,
    /// leaving a bare path for route matching.
    #[must_use]
    pub fn from_target(method: Method, target: &str) -> Self {
        let without_fragment = target.split('#').next().unwrap_or(target);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        let mut req = Self::new(method, path);
        if let Some(query) = query {
            req.query = url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                .collect();
        }
        req
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Add a header, replacing any existing value (names are case-insensitive)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(k, _)| k.as_ref() != name);
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Arc::from(body.into());
        self
    }

    /// Set a JSON body and its content type
    #[must_use]
    pub fn with_json(self, body: &Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Attach a derived value for later middleware steps and the handler
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.retain(|(k, _)| k.as_ref() != name);
        self.attributes.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics for repeated names (`?limit=10&limit=20`).
    #[inline]
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Get a cookie from the `Cookie` header
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")?.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k.trim() == name).then(|| v.trim())
        })
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parse the body as JSON; `None` when empty or not valid JSON
    #[must_use]
    pub fn body_json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}
