use std::fmt;
use std::io::Read;

use http::Method;
use may_minihttp::Request;
use tracing::debug;

use crate::dispatcher::DispatchRequest;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Largest request body accepted by default (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Why a wire request could not be turned into a [`DispatchRequest`]
#[derive(Debug)]
pub enum ParseError {
    /// The method token is not a valid HTTP method
    InvalidMethod(String),
    /// The body exceeds the configured limit
    BodyTooLarge { limit: usize },
    /// Reading the body failed
    Io(std::io::Error),
}

impl ParseError {
    /// Status code the client should see
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ParseError::InvalidMethod(_) => 400,
            ParseError::BodyTooLarge { .. } => 413,
            ParseError::Io(_) => 400,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidMethod(m) => write!(f, "invalid method '{m}'"),
            ParseError::BodyTooLarge { limit } => write!(f, "request body exceeds {limit} bytes"),
            ParseError::Io(e) => write!(f, "failed to read request body: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Turn a `may_minihttp::Request` into a [`DispatchRequest`].
///
/// The target is split into path and query, header names are lowercased, and the
/// body is read last (it consumes the request).
///
/// # Errors
///
/// Returns [`ParseError`] for unknown method tokens, oversized bodies and read
/// failures.
pub fn parse_request(req: Request, max_body_bytes: usize) -> Result<DispatchRequest, ParseError> {
    let method = Method::from_bytes(req.method().as_bytes())
        .map_err(|_| ParseError::InvalidMethod(req.method().to_string()))?;
    let mut parsed = DispatchRequest::from_target(method, req.path());

    // R1: Headers extracted
    let mut header_count = 0usize;
    for h in req.headers() {
        let value = String::from_utf8_lossy(h.value);
        parsed = parsed.with_header(h.name, value.as_ref());
        header_count += 1;
    }
    let request_id = RequestId::from_header_or_new(parsed.header(REQUEST_ID_HEADER));
    parsed = parsed.with_request_id(request_id);

    // R2: Request body read
    let mut body = Vec::new();
    req.body()
        .take(max_body_bytes as u64 + 1)
        .read_to_end(&mut body)
        .map_err(ParseError::Io)?;
    if body.len() > max_body_bytes {
        return Err(ParseError::BodyTooLarge {
            limit: max_body_bytes,
        });
    }

    debug!(
        request_id = %request_id,
        method = %parsed.method(),
        path = %parsed.path(),
        headers_count = header_count,
        query_count = parsed.query_params().count(),
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );

    Ok(parsed.with_body(body))
}
