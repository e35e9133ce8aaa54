//! Sumi-Serp: a concurrent search result page crawler
//!
//! This crate fetches paginated search result pages for many keywords, hands
//! each fetched page to a pluggable parser running on its own task, and
//! reassembles the out-of-order parse output into an ordered
//! keyword → page → result structure.

pub mod config;
pub mod crawler;
pub mod engines;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Serp operations
#[derive(Debug, Error)]
pub enum SerpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Document error: {0}")]
    Document(#[from] crawler::DocumentError),

    #[error("Parse error: {0}")]
    Parse(#[from] crawler::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerpError {
    /// Classifies the error for a crawl failure report
    ///
    /// Returns None for errors that cannot arise while crawling a page.
    pub fn failure_kind(&self) -> Option<crawler::FailureKind> {
        match self {
            Self::Fetch(e) => Some(e.kind()),
            Self::Document(e) => Some(e.kind()),
            Self::Parse(e) => Some(e.kind()),
            Self::Config(_) | Self::Output(_) | Self::Io(_) => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Sumi-Serp operations
pub type Result<T> = std::result::Result<T, SerpError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    CrawlFailure, CrawlInput, CrawlReport, Crawler, FailureKind, NestedResults, ResultTable,
    SearchParser, SearchResult, TaggedResult,
};
pub use engines::SelectorParser;
