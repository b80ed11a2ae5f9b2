//! Error types for endpoint validation, request building and dispatch.
//!
//! # Design
//! `Url`, `Path` and `Response` are the classification surfaced to callers;
//! each carries the offending value so it can be rendered for diagnostics.
//! The remaining variants cover collaborators (transport, decoding,
//! configuration) and the missing-method precondition.

use thiserror::Error;

use crate::http::{Dispatch, RawResponse};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint URL lacks a scheme or a host.
    #[error("'{0}' is not a valid base URL (scheme and host are required)")]
    Url(String),

    /// The request path could not be resolved into a URL.
    #[error("cannot resolve request path '{0}'")]
    Path(String),

    /// The server answered with status >= 400 and no handler took over.
    #[error("server responded with status {}: {}", .response.status, .response.body)]
    Response {
        dispatch: Box<Dispatch>,
        response: Box<RawResponse>,
    },

    /// `to_dispatch` was called before any method was chosen.
    #[error("no request method chosen for '{path}'")]
    MissingMethod { path: String },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The raw reply carried by a `Response` error.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Error::Response { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The dispatch tuple that produced a `Response` error.
    pub fn dispatch(&self) -> Option<&Dispatch> {
        match self {
            Error::Response { dispatch, .. } => Some(dispatch),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }
}
