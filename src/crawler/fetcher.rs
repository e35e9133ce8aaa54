//! HTTP fetcher implementation
//!
//! This module issues the single GET request made for every search page:
//! - Building the HTTP client with the configured User-Agent
//! - Reading the whole body into memory
//! - Classifying request and transport errors
//!
//! No retry and no status check happen here: an error page is handed to the
//! parser like any other page.

use crate::config::UserAgentConfig;
use crate::crawler::types::FailureKind;
use reqwest::Client;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a search page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid search URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to build request for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("failed to read body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Maps the error onto the crawl failure taxonomy
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Client(_) | Self::InvalidUrl { .. } | Self::Request { .. } => {
                FailureKind::Request
            }
            Self::Transport { .. } | Self::Body { .. } => FailureKind::Transport,
        }
    }
}

/// Builds an HTTP client with the configured identification
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use sumi_serp::config::UserAgentConfig;
/// use sumi_serp::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.header.clone())
        .gzip(true)
        .brotli(true);

    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Issues search page requests
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher from user agent configuration
    pub fn new(config: &UserAgentConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(config).map_err(FetchError::Client)?,
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL and returns its body as an in-memory stream
    ///
    /// The response is consumed and released before the buffer is returned.
    /// Status codes are not inspected.
    pub async fn fetch(&self, url: &str) -> Result<Cursor<Vec<u8>>, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let request = self
            .client
            .get(parsed)
            .build()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        tracing::trace!(%url, status = status.as_u16(), bytes = body.len(), "page fetched");

        Ok(Cursor::new(body.to_vec()))
    }
}
