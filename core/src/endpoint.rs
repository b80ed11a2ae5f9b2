//! Validated base location every request is resolved against.

use url::Url;

use crate::error::{Error, Result};

/// Absolute base URL with trailing slashes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
}

impl Endpoint {
    /// Fails with `Error::Url` when `raw_url` has no scheme or no host.
    pub fn new(raw_url: &str) -> Result<Self> {
        let base = raw_url.trim_end_matches('/');
        let url = Url::parse(base).map_err(|_| Error::Url(raw_url.to_string()))?;
        if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
            return Err(Error::Url(raw_url.to_string()));
        }
        Ok(Self {
            base: base.to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Joins `relative_path` onto the base.
    pub fn resolve(&self, relative_path: &str) -> Result<Url> {
        let relative = relative_path.trim_start_matches('/');
        let joined = if relative.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{relative}", self.base)
        };
        parse_located(&joined).ok_or_else(|| Error::Path(relative_path.to_string()))
    }

    /// Turns a request path into a URL. Paths seeded from this endpoint are
    /// already absolute; other absolute URLs are rejected; anything else is
    /// treated as relative to the base.
    pub fn locate(&self, path: &str) -> Result<Url> {
        if self.contains(path) {
            parse_located(path).ok_or_else(|| Error::Path(path.to_string()))
        } else if looks_absolute(path) {
            Err(Error::Path(path.to_string()))
        } else {
            self.resolve(path)
        }
    }

    /// Whether `path` is the base itself or lies below it.
    fn contains(&self, path: &str) -> bool {
        path.strip_prefix(self.base.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

fn looks_absolute(path: &str) -> bool {
    path.contains("://") || Url::parse(path).is_ok()
}

fn parse_located(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().filter(|url| url.has_host())
}
