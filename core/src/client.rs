//! Thin facade tying an endpoint, an adapter and a request context together.
//!
//! # Design
//! `Client` seeds requests with its context and forwards finished requests
//! to its adapter. It holds no per-call state; the only thing that changes
//! over its lifetime is the transport's lazily opened agent.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapter::{Adapter, Transport, UreqTransport};
use crate::config::ClientConfig;
use crate::context::RequestContext;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::http::RawResponse;
use crate::log::WireLog;
use crate::request::Request;

#[derive(Debug)]
pub struct Client<T = UreqTransport> {
    adapter: Adapter<T>,
    context: RequestContext,
}

impl Client<UreqTransport> {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self::with_adapter(Adapter::new(Endpoint::new(base_url)?)))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let endpoint = Endpoint::new(&config.base_url)?;
        let adapter = Adapter::with_transport(endpoint, UreqTransport::with_timeout(config.timeout()));
        let mut context = RequestContext::new().with_method_override(config.method_override);
        if let Some(id) = &config.request_id {
            context = context.with_request_id(id.clone());
        }
        Ok(Self { adapter, context })
    }
}

impl<T> Client<T> {
    pub fn with_adapter(adapter: Adapter<T>) -> Self {
        Self {
            adapter,
            context: RequestContext::new(),
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn WireLog>) -> Self {
        self.adapter = self.adapter.with_logger(logger);
        self
    }

    pub fn adapter(&self) -> &Adapter<T> {
        &self.adapter
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.adapter.endpoint()
    }

    /// A fresh request rooted at the endpoint base.
    pub fn request(&self) -> Request {
        Request::seed(self.adapter.endpoint(), &self.context)
    }
}

impl<T: Transport> Client<T> {
    pub fn call(&self, request: &Request) -> Result<Value> {
        self.adapter.dispatch(&request.to_dispatch()?)
    }

    pub fn call_with<F>(&self, request: &Request, handler: F) -> Result<Value>
    where
        F: FnOnce(RawResponse) -> Value,
    {
        self.adapter.dispatch_with(&request.to_dispatch()?, handler)
    }

    pub fn call_as<R: DeserializeOwned>(&self, request: &Request) -> Result<R> {
        self.adapter.dispatch_as(&request.to_dispatch()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MethodOverride, REQUEST_ID_HEADER};
    use crate::error::Error;
    use crate::http::Method;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn client_is_send_and_sync() {
        assert_send_sync::<Client>();
    }

    #[test]
    fn new_rejects_bad_url() {
        assert!(matches!(Client::new("127.0.0.1"), Err(Error::Url(_))));
    }

    #[test]
    fn requests_start_at_the_base() {
        let client = Client::new("http://localhost:3000/").unwrap();
        assert_eq!(client.request().path(), "http://localhost:3000");
    }

    #[test]
    fn config_shapes_seeded_requests() {
        let mut config = ClientConfig::new("http://localhost:3000");
        config.method_override = MethodOverride::Native;
        config.request_id = Some("req-1".to_string());
        let client = Client::from_config(&config).unwrap();

        let request = client.request().with_method(Method::Delete);
        assert_eq!(request.method(), Some(Method::Delete));
        assert_eq!(request.headers()[REQUEST_ID_HEADER], "req-1");
    }

    #[test]
    fn call_without_method_fails_before_dispatch() {
        let client = Client::new("http://localhost:3000").unwrap();
        let err = client.call(&client.request()).unwrap_err();
        assert!(matches!(err, Error::MissingMethod { .. }));
        assert!(!client.adapter().transport().is_connected());
    }
}
