use crate::dispatcher::DispatchRequest;
use crate::middleware::SUBJECT_ATTRIBUTE;
use crate::pattern::Params;
use serde_json::{json, Map, Value};

/// Handler used by `routewise serve`: echoes back what the dispatcher saw.
///
/// # Errors
///
/// Never fails; the `Result` matches the handler signature.
pub fn echo_handler(req: &DispatchRequest, params: &Params) -> anyhow::Result<Value> {
    let query: Map<String, Value> = req
        .query_params()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();

    Ok(json!({
        "method": req.method().as_str(),
        "path": req.path(),
        "params": params,
        "query": query,
        "subject": req.attribute(SUBJECT_ATTRIBUTE),
        "body": req.body_json(),
        "request_id": req.request_id(),
    }))
}
