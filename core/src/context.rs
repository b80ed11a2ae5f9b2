//! Request-scoped context: correlation id source and method-override policy.
//!
//! # Design
//! The correlation id is never read from global state. A `RequestContext` is
//! handed to `Request::seed` and carries an optional `RequestIdSource`; the
//! caller owns its lifecycle (for `RequestIdContext`, via `set` / `clear`).

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header under which the correlation id is sent.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Something that can report the current correlation id, if any.
pub trait RequestIdSource: fmt::Debug + Send + Sync {
    fn request_id(&self) -> Option<String>;
}

impl RequestIdSource for String {
    fn request_id(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl RequestIdSource for &'static str {
    fn request_id(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

/// Shared, mutable correlation id cell.
///
/// Clones share the same cell, so a value set through one handle is visible
/// to every request seeded from a context holding another.
#[derive(Debug, Clone, Default)]
pub struct RequestIdContext {
    value: Arc<RwLock<Option<String>>>,
}

impl RequestIdContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: impl Into<String>) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(id.into());
    }

    /// Store a fresh random id and return it.
    pub fn generate(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.set(id.clone());
        id
    }

    pub fn clear(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.value.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RequestIdSource for RequestIdContext {
    fn request_id(&self) -> Option<String> {
        self.get()
    }
}

/// How verbs other than GET and POST reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodOverride {
    /// Send as POST with a `_method` body field naming the real verb.
    #[default]
    Emulate,
    /// Send the verb as-is.
    Native,
}

/// Context every request is seeded with.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: Option<Arc<dyn RequestIdSource>>,
    method_override: MethodOverride,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id<S>(mut self, source: S) -> Self
    where
        S: RequestIdSource + 'static,
    {
        self.request_id = Some(Arc::new(source));
        self
    }

    pub fn with_method_override(mut self, method_override: MethodOverride) -> Self {
        self.method_override = method_override;
        self
    }

    /// Reads the source now. Callers that need read-once semantics cache
    /// the result themselves.
    pub fn request_id(&self) -> Option<String> {
        self.request_id.as_ref().and_then(|source| source.request_id())
    }

    pub fn method_override(&self) -> MethodOverride {
        self.method_override
    }
}
