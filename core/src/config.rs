//! Client configuration.
//!
//! # Design
//! `ClientConfig` deserializes with serde (for callers embedding it in a
//! larger config file) and can be read from `COURIER_*` environment
//! variables. `from_lookup` takes the variable source as a function so the
//! parsing is testable without touching the process environment.

use std::time::Duration;

use serde::Deserialize;

use crate::context::MethodOverride;
use crate::error::{Error, Result};

pub const ENV_BASE_URL: &str = "COURIER_BASE_URL";
pub const ENV_METHOD_OVERRIDE: &str = "COURIER_METHOD_OVERRIDE";
pub const ENV_TIMEOUT_SECS: &str = "COURIER_TIMEOUT_SECS";
pub const ENV_REQUEST_ID: &str = "COURIER_REQUEST_ID";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub method_override: MethodOverride,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Fixed correlation id attached to every request.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method_override: MethodOverride::default(),
            timeout_secs: None,
            request_id: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| Error::Config(format!("{ENV_BASE_URL} is not set")))?;

        let method_override = match lookup(ENV_METHOD_OVERRIDE).as_deref() {
            None | Some("") => MethodOverride::default(),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "emulate" => MethodOverride::Emulate,
                "native" => MethodOverride::Native,
                _ => {
                    return Err(Error::Config(format!(
                        "{ENV_METHOD_OVERRIDE} must be 'emulate' or 'native', got '{raw}'"
                    )))
                }
            },
        };

        let timeout_secs = lookup(ENV_TIMEOUT_SECS)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<u64>().map_err(|_| {
                    Error::Config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got '{raw}'"))
                })
            })
            .transpose()?;

        let request_id = lookup(ENV_REQUEST_ID).filter(|id| !id.is_empty());

        Ok(Self {
            base_url,
            method_override,
            timeout_secs,
            request_id,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
