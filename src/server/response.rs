use std::collections::HashSet;
use std::sync::Mutex;

use may_minihttp::Response;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatcher::DispatchResponse;

/// Distinct dynamic header lines kept for reuse
pub const MAX_INTERNED_HEADERS: usize = 4096;

/// `may_minihttp` only accepts `&'static str` header lines. Dynamic lines are leaked
/// once and reused while the table has room; past the cap each line is leaked per
/// response instead of being dropped.
static HEADER_LINES: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "OK",
    }
}

fn intern_header_line(name: &str, value: &str) -> Option<&'static str> {
    // CR/LF would split the header block
    if name.contains(['\r', '\n']) || value.contains(['\r', '\n']) {
        warn!(header = %name, "Dropping header with line break");
        return None;
    }
    let line = format!("{name}: {value}");
    let mut lines = match HEADER_LINES.lock() {
        Ok(lines) => lines,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(existing) = lines.get(line.as_str()) {
        return Some(*existing);
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    if lines.len() < MAX_INTERNED_HEADERS {
        lines.insert(leaked);
    } else {
        debug!(header = %name, "Header intern table full; leaking line for this response");
    }
    Some(leaked)
}

fn is_json_content_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Encode `body` for the wire.
///
/// Returns the content type line to add when the response names none, and the body
/// bytes (`None` for an empty body). A JSON content type always gets serialized JSON.
fn encode_body(content_type: Option<&str>, body: Value) -> (Option<&'static str>, Option<Vec<u8>>) {
    let as_json = |body: &Value| match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to serialize response body");
            Vec::new()
        }
    };
    match (content_type, body) {
        (Some(ct), body) if is_json_content_type(ct) => (None, Some(as_json(&body))),
        (_, Value::Null) => (None, None),
        (Some(_), Value::String(s)) => (None, Some(s.into_bytes())),
        (Some(_), other) => (None, Some(as_json(&other))),
        (None, Value::String(s)) => (Some("Content-Type: text/plain"), Some(s.into_bytes())),
        (None, other) => (Some("Content-Type: application/json"), Some(as_json(&other))),
    }
}

/// Write a dispatch response to the wire.
///
/// A JSON content type always gets a serialized JSON body. Otherwise `Value::String`
/// bodies are sent as raw text (`text/plain` when no type is set), `Value::Null` as an
/// empty body and any other value as JSON.
pub fn write_response(res: &mut Response, response: DispatchResponse) {
    let DispatchResponse {
        status,
        headers,
        body,
    } = response;
    res.status_code(status as usize, status_reason(status));

    let mut content_type = None;
    for (name, value) in &headers {
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.as_str());
        }
        if let Some(line) = intern_header_line(name, value) {
            res.header(line);
        }
    }

    let (default_content_type, bytes) = encode_body(content_type, body);
    if let Some(line) = default_content_type {
        res.header(line);
    }
    if let Some(bytes) = bytes {
        res.body_vec(bytes);
    }
}
