//! Wire-level logging sink.
//!
//! The adapter reports every request it writes and every reply it reads to
//! an optional `WireLog`. Without one, nothing is logged.

use crate::http::{RawResponse, WireRequest};

pub trait WireLog: Send + Sync {
    fn write(&self, request: &WireRequest);
    fn read(&self, response: &RawResponse);
}

/// Forwards wire events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWireLog;

impl WireLog for TracingWireLog {
    fn write(&self, request: &WireRequest) {
        tracing::debug!(
            target: "courier::wire",
            method = %request.method,
            url = %request.url,
            body = request.body.as_deref().unwrap_or(""),
            "request written"
        );
    }

    fn read(&self, response: &RawResponse) {
        tracing::debug!(
            target: "courier::wire",
            status = response.status,
            body = %response.body,
            "response read"
        );
    }
}
