//! Data carried through the crawl pipeline
//!
//! Parse tasks complete in any order, so everything they send to the
//! reducer carries its own (keyword, page, index) coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed search entry
///
/// `SearchResult::default()` is the placeholder used to keep positional
/// sequences contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl SearchResult {
    /// Creates a result from its three fields
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
        }
    }

    /// Returns true if this is an unfilled placeholder
    pub fn is_placeholder(&self) -> bool {
        self.title.is_empty() && self.url.is_empty() && self.description.is_empty()
    }
}

/// A result tagged with the coordinates it belongs at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedResult {
    pub keyword: String,
    pub page: u32,
    /// Zero-based position of the result within its page
    pub index: usize,
    pub result: SearchResult,
}

/// Classified reason a (keyword, page) task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    /// The search URL or request could not be built
    Request,
    /// The request could not be sent or its body could not be read
    Transport,
    /// The fetched body could not be turned into a document
    Document,
    /// The parser reported an error while extracting results
    Extraction,
    /// The parse task panicked
    Panicked,
}

impl FailureKind {
    /// Returns a short lowercase label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Transport => "transport",
            Self::Document => "document",
            Self::Extraction => "extraction",
            Self::Panicked => "panicked",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A (keyword, page) task that did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlFailure {
    pub keyword: String,
    pub page: u32,
    pub kind: FailureKind,
    pub message: String,
}

impl CrawlFailure {
    pub fn new(
        keyword: impl Into<String>,
        page: u32,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            page,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CrawlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' page {}: {} failure: {}",
            self.keyword, self.page, self.kind, self.message
        )
    }
}

/// Message sent from the dispatcher and parse tasks to the reducer
///
/// Each enumerated task ends with exactly one `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A result was extracted
    Found(TaggedResult),
    /// A page was parsed; `emitted` results were sent before this event
    Completed {
        keyword: String,
        page: u32,
        emitted: usize,
    },
    /// A page could not be fetched or parsed
    Failed(CrawlFailure),
}
