use super::request::HeaderVec;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// The single result produced for every dispatched request.
///
/// Body conventions: with a JSON content type the body is always serialized JSON.
/// Otherwise `Value::String` is sent as raw text, `Value::Null` as an empty body and
/// anything else as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// Response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl DispatchResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self::new(status, headers, Value::String(body.into()))
    }

    #[must_use]
    pub fn ok_text(body: impl Into<String>) -> Self {
        Self::text(200, body)
    }

    /// Create an error response: `{"error": message}`
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// `302 Found` pointing at `location`
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("location"), location.to_string()));
        Self::new(302, headers, Value::Null)
    }

    /// Generic not-found fallback
    #[must_use]
    pub fn not_found(method: &str, path: &str) -> Self {
        Self::json(
            404,
            serde_json::json!({ "error": "Not Found", "method": method, "path": path }),
        )
    }

    /// Generic server-error fallback, never carrying the fault's details
    #[must_use]
    pub fn internal_error() -> Self {
        Self::error(500, "Internal Server Error")
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name.to_ascii_lowercase()), value));
    }

    /// 3xx with a `Location` header
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.location().is_some()
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.get_header("location")
    }
}

/// What a handler may return.
///
/// Raw values are wrapped into a default success envelope; a structured
/// [`DispatchResponse`] passes through unchanged. Both the server dispatcher and the
/// client navigator normalize handler results through [`HandlerOutput::into_response`].
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// `200` with a `text/plain` body
    Text(String),
    /// `200` with a JSON body
    Json(Value),
    /// `204 No Content`
    Empty,
    /// Passed through as-is
    Response(DispatchResponse),
}

impl HandlerOutput {
    #[must_use]
    pub fn into_response(self) -> DispatchResponse {
        match self {
            HandlerOutput::Text(s) => DispatchResponse::ok_text(s),
            HandlerOutput::Json(v) => DispatchResponse::json(200, v),
            HandlerOutput::Empty => DispatchResponse::new(204, HeaderVec::new(), Value::Null),
            HandlerOutput::Response(r) => r,
        }
    }
}

impl From<String> for HandlerOutput {
    fn from(s: String) -> Self {
        HandlerOutput::Text(s)
    }
}

impl From<&str> for HandlerOutput {
    fn from(s: &str) -> Self {
        HandlerOutput::Text(s.to_string())
    }
}

impl From<Value> for HandlerOutput {
    fn from(v: Value) -> Self {
        HandlerOutput::Json(v)
    }
}

impl From<DispatchResponse> for HandlerOutput {
    fn from(r: DispatchResponse) -> Self {
        HandlerOutput::Response(r)
    }
}

impl From<()> for HandlerOutput {
    fn from(_: ()) -> Self {
        HandlerOutput::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_values_are_wrapped() {
        let r = HandlerOutput::from("hello").into_response();
        assert_eq!(r.status, 200);
        assert_eq!(r.body, json!("hello"));
        assert_eq!(r.get_header("Content-Type"), Some("text/plain"));

        let r = HandlerOutput::from(json!({"id": 1})).into_response();
        assert_eq!(r.status, 200);
        assert_eq!(r.get_header("content-type"), Some("application/json"));

        let r = HandlerOutput::from(()).into_response();
        assert_eq!(r.status, 204);
        assert_eq!(r.body, Value::Null);
    }

    #[test]
    fn test_structured_response_passes_through() {
        let original = DispatchResponse::error(409, "conflict");
        let r = HandlerOutput::from(original.clone()).into_response();
        assert_eq!(r, original);
    }

    #[test]
    fn test_redirect() {
        let r = DispatchResponse::redirect("/login");
        assert!(r.is_redirect());
        assert_eq!(r.location(), Some("/login"));
        assert!(!DispatchResponse::ok_text("x").is_redirect());
    }

    #[test]
    fn test_set_header_replaces() {
        let mut r = DispatchResponse::ok_text("x");
        r.set_header("Content-Type", "text/html".to_string());
        assert_eq!(r.get_header("content-type"), Some("text/html"));
        assert_eq!(r.headers.len(), 1);
    }
}
