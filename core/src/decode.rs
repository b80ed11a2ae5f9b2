//! Decoding of successful reply bodies.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::RawResponse;

/// Decodes a reply body into a JSON value.
///
/// Empty bodies become `Null`. Bodies that are not JSON are returned as a
/// string unless the server declared a JSON content type, in which case the
/// parse failure is an error.
pub fn decode(response: &RawResponse) -> Result<Value> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let declared_json = response
        .header("content-type")
        .is_some_and(|content_type| content_type.contains("json"));
    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(value),
        Err(e) if declared_json => Err(Error::Decode(e.to_string())),
        Err(_) => Ok(Value::String(response.body.clone())),
    }
}
