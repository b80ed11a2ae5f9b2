//! Immutable request builder.
//!
//! # Design
//! `Request` is a plain value. Every `with_*` method clones the receiver,
//! changes the clone and returns it, so two requests derived from the same
//! parent never share mutable state. Headers are computed on first access
//! (reading the request id from the seed context exactly once) and memoized
//! for the lifetime of the instance.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::context::{MethodOverride, RequestContext, REQUEST_ID_HEADER};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::http::{Dispatch, Method, Params};

/// Body field naming the real verb when it is tunneled through POST.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json; charset=utf-8"),
    ("Accept", "application/json"),
];

/// An in-progress request against one endpoint.
#[derive(Debug, Clone)]
pub struct Request {
    method: Option<Method>,
    path: String,
    query: BTreeMap<String, String>,
    body: BTreeMap<String, String>,
    headers: OnceLock<BTreeMap<String, String>>,
    context: RequestContext,
}

impl Request {
    /// Empty request rooted at the endpoint base. No method is chosen yet.
    pub fn seed(endpoint: &Endpoint, context: &RequestContext) -> Self {
        Self {
            method: None,
            path: endpoint.base().to_string(),
            query: BTreeMap::new(),
            body: BTreeMap::new(),
            headers: OnceLock::new(),
            context: context.clone(),
        }
    }

    /// The method that will be sent on the wire, if chosen.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn body(&self) -> &BTreeMap<String, String> {
        &self.body
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Default headers plus `X-Request-Id` when the context has one.
    ///
    /// The context is consulted on the first call only; later changes to the
    /// request id are not picked up by this instance.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        self.headers.get_or_init(|| {
            let mut headers: BTreeMap<String, String> = DEFAULT_HEADERS
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            if let Some(id) = self.context.request_id() {
                headers.insert(REQUEST_ID_HEADER.to_string(), id);
            }
            headers
        })
    }

    /// Appends path segments. Each segment is split on `/` and empty parts
    /// are dropped, so `with_path(["a/b", "", "c"])` adds `/a/b/c`. `?` and
    /// `#` are percent-encoded so a segment never starts a query or fragment.
    pub fn with_path<I>(&self, segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut path = self.path.clone();
        for segment in segments {
            for part in segment.as_ref().split('/').filter(|part| !part.is_empty()) {
                path.push('/');
                path.push_str(&escape_segment(part));
            }
        }
        Self { path, ..self.clone() }
    }

    /// Merges headers; later values win.
    pub fn with_headers<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = self.headers().clone();
        merge(&mut headers, pairs);
        Self {
            headers: OnceLock::from(headers),
            ..self.clone()
        }
    }

    /// Merges query parameters; later values win.
    pub fn with_query<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query = self.query.clone();
        merge(&mut query, pairs);
        Self { query, ..self.clone() }
    }

    /// Merges body fields; later values win.
    pub fn with_body<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut body = self.body.clone();
        merge(&mut body, pairs);
        Self { body, ..self.clone() }
    }

    /// Chooses the verb.
    ///
    /// GET always drops the body. Under `MethodOverride::Emulate` every verb
    /// other than GET and POST is sent as POST with `_method=<verb>` in the
    /// body; POST strips that field. Under `Native` the verb is kept and the
    /// field is stripped.
    pub fn with_method(&self, verb: Method) -> Self {
        let mut body = self.body.clone();
        let method = match (verb, self.context.method_override()) {
            (Method::Get, _) => {
                body.clear();
                Method::Get
            }
            (Method::Post, _) | (_, MethodOverride::Native) => {
                body.remove(METHOD_OVERRIDE_FIELD);
                verb
            }
            (_, MethodOverride::Emulate) => {
                body.insert(METHOD_OVERRIDE_FIELD.to_string(), verb.name().to_string());
                Method::Post
            }
        };
        Self {
            method: Some(method),
            body,
            ..self.clone()
        }
    }

    /// Converts the request into the tuple the adapter executes.
    pub fn to_dispatch(&self) -> Result<Dispatch> {
        let method = self.method.ok_or_else(|| Error::MissingMethod {
            path: self.path.clone(),
        })?;
        Ok(Dispatch {
            method,
            path: self.path.clone(),
            params: Params {
                header: self.headers().clone(),
                query: non_empty(&self.query),
                body: non_empty(&self.body),
            },
        })
    }
}

fn merge<I, K, V>(target: &mut BTreeMap<String, String>, pairs: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    target.extend(pairs.into_iter().map(|(key, value)| (key.into(), value.into())));
}

fn escape_segment(part: &str) -> String {
    part.replace('?', "%3F").replace('#', "%23")
}

fn non_empty(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}
