//! Document fetching for site variables and JSON-LD templates.
//!
//! Two sources behind one trait:
//!
//! | Source         | Same-origin URL               | Foreign URL |
//! |----------------|-------------------------------|-------------|
//! | [`HttpFetcher`]| HTTP GET                      | HTTP GET    |
//! | [`SiteFetcher`]| file under the site directory | HTTP GET    |
//!
//! Every request is attempted exactly once. A missing local file reports
//! the same `404` status an HTTP origin would.

use crate::config::{FetchMode, SiteConfig};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Failure to retrieve or decode a remote document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch `{url}`: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to fetch `{url}`: {reason}")]
    Transport { url: String, reason: String },

    #[error("failed to read `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid JSON from `{url}`: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A source of documents addressed by URL.
pub trait Fetch: Send + Sync {
    /// Fetch the body of `url` as text.
    fn get(&self, url: &Url) -> Result<String, FetchError>;
}

/// Fetch `url` and deserialize its body as JSON.
pub fn fetch_json<T: DeserializeOwned>(fetcher: &dyn Fetch, url: &Url) -> Result<T, FetchError> {
    let body = fetcher.get(url)?;
    serde_json::from_str(&body).map_err(|source| FetchError::Json {
        url: url.to_string(),
        source,
    })
}

/// Build the fetcher selected by `[fetch.mode]`.
pub fn fetcher_for(config: &SiteConfig) -> Result<Box<dyn Fetch>> {
    Ok(match config.fetch.mode {
        FetchMode::Http => Box::new(HttpFetcher::new()),
        FetchMode::Local => Box::new(SiteFetcher::new(&config.site.root, config.origin()?)),
    })
}

// ============================================================================
// HTTP
// ============================================================================

/// Plain HTTP GET over a shared `ureq` agent.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &Url) -> Result<String, FetchError> {
        let transport = |err: ureq::Error| match err {
            ureq::Error::StatusCode(status) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            other => FetchError::Transport {
                url: url.to_string(),
                reason: other.to_string(),
            },
        };

        let response = self.agent.get(url.as_str()).call().map_err(transport)?;
        response.into_body().read_to_string().map_err(transport)
    }
}

// ============================================================================
// Site directory
// ============================================================================

/// Serves same-origin URLs from the built site directory.
pub struct SiteFetcher {
    root: PathBuf,
    origin: Url,
    http: HttpFetcher,
}

impl SiteFetcher {
    pub fn new(root: &Path, origin: Url) -> Self {
        Self {
            root: root.to_path_buf(),
            origin,
            http: HttpFetcher::new(),
        }
    }

    /// Map a same-origin URL to a file below the site root.
    ///
    /// Returns `None` for foreign origins and for paths escaping the root.
    fn local_path(&self, url: &Url) -> Option<PathBuf> {
        if url.origin() != self.origin.origin() {
            return None;
        }
        let decoded = urlencoding::decode(url.path()).ok()?;
        let relative = Path::new(decoded.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Fetch for SiteFetcher {
    fn get(&self, url: &Url) -> Result<String, FetchError> {
        if url.origin() != self.origin.origin() {
            return self.http.get(url);
        }

        let not_found = || FetchError::Status {
            url: url.to_string(),
            status: 404,
        };
        let path = self.local_path(url).ok_or_else(not_found)?;
        if !path.is_file() {
            return Err(not_found());
        }
        fs::read_to_string(&path).map_err(|err| FetchError::Io(path, err))
    }
}

// ============================================================================
// Test support
// ============================================================================
