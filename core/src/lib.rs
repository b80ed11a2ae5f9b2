//! Request construction and dispatch core for JSON HTTP APIs.
//!
//! # Overview
//! An `Endpoint` anchors every call. `Request` values are seeded from it and
//! refined through pure `with_*` transformations; the finished request turns
//! into a `Dispatch` tuple that an `Adapter` executes and classifies into
//! either a decoded payload or a typed `Error`.
//!
//! # Design
//! - `Request` is an immutable value: every transformation returns a new
//!   instance and never touches the receiver.
//! - Non-GET/POST verbs are tunneled through POST with a `_method` body
//!   field unless `MethodOverride::Native` is configured.
//! - The adapter talks to the network through the `Transport` trait; the
//!   default `UreqTransport` opens its agent lazily on first dispatch.
//! - The request id is read from an explicit `RequestContext`, never from
//!   global state.

pub mod adapter;
pub mod client;
pub mod config;
pub mod context;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod log;
pub mod request;

pub use adapter::{Adapter, Transport, UreqTransport};
pub use client::Client;
pub use config::ClientConfig;
pub use context::{MethodOverride, RequestContext, RequestIdContext, RequestIdSource};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use http::{Dispatch, Method, Params, RawResponse, WireRequest};
pub use log::{TracingWireLog, WireLog};
pub use request::Request;
