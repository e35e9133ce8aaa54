//! Crawler module for search result pages
//!
//! This module contains the core crawling pipeline:
//! - HTTP fetching of result pages
//! - The parser contract search engines implement
//! - Fan-out of parse tasks and fan-in of their results
//! - Overall crawl coordination

mod completion;
mod coordinator;
mod dispatcher;
mod fetcher;
mod parser;
mod reducer;
mod table;
mod types;

pub use completion::{CompletionGuard, CompletionTracker};
pub use coordinator::{CrawlOptions, CrawlReport, Crawler};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use parser::{Document, DocumentError, ParseError, ResultSink, SearchParser};
pub use reducer::{CrawlStats, Reducer};
pub use table::{NestedResults, ResultTable};
pub use types::{CrawlEvent, CrawlFailure, FailureKind, SearchResult, TaggedResult};

use crate::config::Config;
use crate::engines::SelectorParser;
use crate::SerpError;
use std::collections::BTreeMap;

/// Keyword → page numbers to crawl, in order
pub type CrawlInput = BTreeMap<String, Vec<u32>>;

/// Runs a complete crawl described by a configuration
///
/// This is the main entry point for the command line. It will:
/// 1. Build the selector parser for the configured engine
/// 2. Build the HTTP client
/// 3. Fetch and parse every configured (keyword, page)
/// 4. Return the assembled report
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran; individual page failures are in the report
/// * `Err(SerpError)` - The parser or HTTP client could not be built
pub async fn crawl(config: &Config) -> Result<CrawlReport, SerpError> {
    let parser = SelectorParser::from_config(&config.engine)?;
    let fetcher = Fetcher::new(&config.user_agent)?;

    let crawler = Crawler::new(config.keywords.clone(), parser, fetcher)
        .with_options(CrawlOptions::from(&config.crawler));

    Ok(crawler.start().await)
}
