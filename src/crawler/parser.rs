//! Parser contract for search result pages
//!
//! A [`SearchParser`] knows one search engine: how to build the URL of a
//! result page and how to pull results out of the fetched [`Document`].
//! Results leave the parser through a [`ResultSink`], which tags each one
//! with the keyword and page it was parsed for.

use crate::crawler::types::{CrawlEvent, FailureKind, SearchResult, TaggedResult};
use scraper::Html;
use std::cell::Cell;
use std::io::Read;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Errors raised while turning a fetched body into a [`Document`]
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document body: {0}")]
    Read(#[from] std::io::Error),
}

impl DocumentError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Document
    }
}

/// Errors raised by a parser while extracting results
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("result channel closed")]
    SinkClosed,

    #[error("{0}")]
    Extraction(String),
}

impl ParseError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Extraction
    }
}

/// A fetched search result page
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    html: String,
}

impl Document {
    /// Reads a whole body from `reader`
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD; only I/O errors fail.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL the body was fetched from
    /// * `reader` - The body stream returned by the fetcher
    pub fn from_reader(url: impl Into<String>, mut reader: impl Read) -> Result<Self, DocumentError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self {
            url: url.into(),
            html: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Creates a document from markup already in memory
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// The URL the document was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The fetch URL parsed for resolving relative links
    pub fn base_url(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    /// Raw markup
    pub fn text(&self) -> &str {
        &self.html
    }

    /// Parses the markup into a DOM
    ///
    /// The DOM is not `Send`; build it inside the parse call.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Emits tagged results for one (keyword, page) task
///
/// Parsers run on the blocking thread pool, so [`ResultSink::emit`] blocks
/// until the reducer has room in the channel.
#[derive(Debug)]
pub struct ResultSink {
    tx: mpsc::Sender<CrawlEvent>,
    keyword: String,
    page: u32,
    emitted: Cell<usize>,
}

impl ResultSink {
    /// Creates a sink sending into `tx`
    pub fn new(tx: mpsc::Sender<CrawlEvent>, keyword: impl Into<String>, page: u32) -> Self {
        Self {
            tx,
            keyword: keyword.into(),
            page,
            emitted: Cell::new(0),
        }
    }

    /// Sends the result found at `index` within the page
    ///
    /// Must not be called from inside an async context.
    pub fn emit(&self, index: usize, result: SearchResult) -> Result<(), ParseError> {
        let tagged = TaggedResult {
            keyword: self.keyword.clone(),
            page: self.page,
            index,
            result,
        };

        self.tx
            .blocking_send(CrawlEvent::Found(tagged))
            .map_err(|_| ParseError::SinkClosed)?;
        self.emitted.set(self.emitted.get() + 1);
        Ok(())
    }

    /// Number of results emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted.get()
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

/// A pluggable search engine page parser
///
/// Implementations must be cheap to share across tasks; one instance serves
/// every page of a crawl.
pub trait SearchParser: Send + Sync + 'static {
    /// Builds the URL of result page `page` for `keyword`
    ///
    /// Must be pure: the same input always yields the same URL.
    fn search_url(&self, keyword: &str, page: u32) -> String;

    /// Extracts results from a fetched page
    ///
    /// Each result is emitted with its zero-based position on the page.
    /// Must return in bounded time.
    fn parse(
        &self,
        document: &Document,
        keyword: &str,
        page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError>;
}
