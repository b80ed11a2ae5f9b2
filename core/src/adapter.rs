//! Executes dispatch tuples against one endpoint and classifies replies.
//!
//! # Design
//! `Adapter` owns the endpoint, a `Transport` and an optional `WireLog`.
//! It resolves the dispatch path, encodes query and body, hands the
//! resulting `WireRequest` to the transport and classifies the reply:
//! status < 400 is decoded, anything else goes to the caller's handler or
//! becomes `Error::Response`.
//!
//! `UreqTransport` builds its `ureq::Agent` on the first `execute` and
//! reuses it for every later call. The agent pools connections internally
//! and is `Send + Sync`, so one adapter may be shared between threads.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::decode::decode;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::http::{Dispatch, Method, RawResponse, WireRequest};
use crate::log::WireLog;

/// Performs one HTTP exchange.
///
/// Implementations must return error statuses as `RawResponse` values;
/// `Err` is reserved for failures to complete the exchange at all.
pub trait Transport {
    fn execute(&self, request: &WireRequest) -> Result<RawResponse>;
}

/// Blocking transport backed by `ureq`.
#[derive(Default)]
pub struct UreqTransport {
    timeout: Option<Duration>,
    agent: OnceLock<ureq::Agent>,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            agent: OnceLock::new(),
        }
    }

    /// Whether the underlying agent has been opened yet.
    pub fn is_connected(&self) -> bool {
        self.agent.get().is_some()
    }

    fn agent(&self) -> &ureq::Agent {
        self.agent.get_or_init(|| {
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(self.timeout)
                .build()
                .new_agent()
        })
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("timeout", &self.timeout)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &WireRequest) -> Result<RawResponse> {
        let agent = self.agent();
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (Method::Get, _) => with_headers(agent.get(url), headers).call(),
            (Method::Delete, None) => with_headers(agent.delete(url), headers).call(),
            (Method::Delete, Some(body)) => with_headers(agent.delete(url), headers)
                .force_send_body()
                .send(body),
            (Method::Post, Some(body)) => with_headers(agent.post(url), headers).send(body),
            (Method::Post, None) => with_headers(agent.post(url), headers).send_empty(),
            (Method::Put, Some(body)) => with_headers(agent.put(url), headers).send(body),
            (Method::Put, None) => with_headers(agent.put(url), headers).send_empty(),
            (Method::Patch, Some(body)) => with_headers(agent.patch(url), headers).send(body),
            (Method::Patch, None) => with_headers(agent.patch(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

/// Dispatches requests against a single endpoint.
pub struct Adapter<T = UreqTransport> {
    endpoint: Endpoint,
    transport: T,
    logger: Option<Arc<dyn WireLog>>,
}

impl Adapter<UreqTransport> {
    /// Adapter over the default `ureq` transport. No connection is opened
    /// until the first dispatch.
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_transport(endpoint, UreqTransport::new())
    }
}

impl<T> Adapter<T> {
    pub fn with_transport(endpoint: Endpoint, transport: T) -> Self {
        Self {
            endpoint,
            transport,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn WireLog>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves a dispatch tuple into a concrete wire request.
    pub fn wire_request(&self, dispatch: &Dispatch) -> Result<WireRequest> {
        let mut url = self.endpoint.locate(&dispatch.path)?;
        if let Some(query) = &dispatch.params.query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let body = match &dispatch.params.body {
            Some(body) => Some(
                serde_json::to_string(body)
                    .map_err(|e| Error::Transport(format!("cannot encode body: {e}")))?,
            ),
            None => None,
        };

        Ok(WireRequest {
            method: dispatch.method,
            url: url.into(),
            headers: dispatch
                .params
                .header
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            body,
        })
    }
}

impl<T: Transport> Adapter<T> {
    /// Executes the dispatch and decodes a successful reply.
    ///
    /// Fails with `Error::Response` when the server answers with status
    /// >= 400.
    pub fn dispatch(&self, dispatch: &Dispatch) -> Result<Value> {
        let response = self.exchange(dispatch)?;
        if response.is_error() {
            return Err(Error::Response {
                dispatch: Box::new(dispatch.clone()),
                response: Box::new(response),
            });
        }
        decode(&response)
    }

    /// Like `dispatch`, but an error reply is handed to `handler` and its
    /// return value becomes the result of the call.
    pub fn dispatch_with<F>(&self, dispatch: &Dispatch, handler: F) -> Result<Value>
    where
        F: FnOnce(RawResponse) -> Value,
    {
        let response = self.exchange(dispatch)?;
        if response.is_error() {
            return Ok(handler(response));
        }
        decode(&response)
    }

    /// Dispatches and deserializes a successful reply into `R`.
    pub fn dispatch_as<R: DeserializeOwned>(&self, dispatch: &Dispatch) -> Result<R> {
        let value = self.dispatch(dispatch)?;
        serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
    }

    fn exchange(&self, dispatch: &Dispatch) -> Result<RawResponse> {
        let request = self.wire_request(dispatch)?;
        if let Some(logger) = &self.logger {
            logger.write(&request);
        }
        let response = self.transport.execute(&request)?;
        if let Some(logger) = &self.logger {
            logger.read(&response);
        }
        Ok(response)
    }
}

impl<T> fmt::Debug for Adapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("endpoint", &self.endpoint)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}
