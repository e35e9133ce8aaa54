//! Crawler coordinator - crawl orchestration
//!
//! This module wires the two halves of a crawl together:
//! - Counting the (keyword, page) tasks and sizing the completion tracker
//! - Launching the dispatcher on a background task
//! - Running the reducer on the caller's task until the channel closes
//! - Assembling the final [`CrawlReport`]
//!
//! All coordination state is created per [`Crawler::start`] call, so one
//! crawler can run several crawls at the same time.

use crate::config::CrawlerConfig;
use crate::config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_PAGE_NUMBER, DEFAULT_MAX_RESULT_INDEX};
use crate::crawler::completion::CompletionTracker;
use crate::crawler::dispatcher::Dispatcher;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::SearchParser;
use crate::crawler::reducer::{CrawlStats, Reducer};
use crate::crawler::table::{NestedResults, ResultTable};
use crate::crawler::types::CrawlFailure;
use crate::crawler::CrawlInput;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Tuning knobs for a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum parse tasks alive at once; `None` spawns one per page freely
    pub max_concurrent_parses: Option<usize>,
    /// Capacity of the channel between parse tasks and the reducer
    pub channel_capacity: usize,
    /// Highest page number the dispatcher will fetch
    pub max_page_number: u32,
    /// Highest result index the reducer accepts
    pub max_result_index: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_concurrent_parses: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_page_number: DEFAULT_MAX_PAGE_NUMBER,
            max_result_index: DEFAULT_MAX_RESULT_INDEX,
        }
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrent_parses: config.max_concurrent_parses.map(|n| n as usize),
            channel_capacity: config.channel_capacity,
            max_page_number: config.max_page_number,
            max_result_index: config.max_result_index,
        }
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Results addressed by keyword, page and index
    pub results: ResultTable,
    /// Tasks that did not complete, in the order they were reported
    pub failures: Vec<CrawlFailure>,
    pub stats: CrawlStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Positional keyword → pages → results view
    pub fn nested(&self) -> NestedResults {
        self.results.to_nested()
    }

    /// Failures recorded for one (keyword, page) pair
    pub fn failures_for<'a>(
        &'a self,
        keyword: &'a str,
        page: u32,
    ) -> impl Iterator<Item = &'a CrawlFailure> + 'a {
        self.failures
            .iter()
            .filter(move |f| f.keyword == keyword && f.page == page)
    }

    /// Returns true if every task completed without failure
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.stats.is_fully_accounted()
    }

    /// Wall-clock duration of the crawl in milliseconds
    pub fn duration_millis(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Crawls search result pages for a set of keywords
///
/// # Example
///
/// ```no_run
/// use sumi_serp::config::{EngineConfig, EnginePreset, UserAgentConfig};
/// use sumi_serp::crawler::{CrawlInput, Crawler, Fetcher};
/// use sumi_serp::SelectorParser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = EngineConfig {
///     preset: EnginePreset::DuckDuckGo,
///     url_template: None,
///     results_per_page: None,
///     result_selector: None,
///     title_selector: None,
///     link_selector: None,
///     description_selector: None,
/// };
/// let parser = SelectorParser::from_config(&engine)?;
/// let fetcher = Fetcher::new(&UserAgentConfig::default())?;
///
/// let mut input = CrawlInput::new();
/// input.insert("cats".to_string(), vec![0, 1]);
///
/// let report = Crawler::new(input, parser, fetcher).start().await;
/// println!("{} results", report.results.len());
/// # Ok(())
/// # }
/// ```
pub struct Crawler<P: SearchParser> {
    input: Arc<CrawlInput>,
    parser: Arc<P>,
    fetcher: Fetcher,
    options: CrawlOptions,
}

impl<P: SearchParser> Crawler<P> {
    /// Creates a crawler with default options
    pub fn new(input: CrawlInput, parser: P, fetcher: Fetcher) -> Self {
        Self {
            input: Arc::new(input),
            parser: Arc::new(parser),
            fetcher,
            options: CrawlOptions::default(),
        }
    }

    /// Replaces the crawl options
    pub fn with_options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    pub fn input(&self) -> &CrawlInput {
        &self.input
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Number of (keyword, page) tasks one crawl enumerates
    pub fn task_count(&self) -> usize {
        self.input.values().map(Vec::len).sum()
    }

    /// Runs one crawl and returns its report
    ///
    /// Never fails: pages that could not be fetched or parsed are listed in
    /// [`CrawlReport::failures`] next to the partial results.
    pub async fn start(&self) -> CrawlReport {
        let started_at = Utc::now();
        let expected = self.task_count();

        tracing::info!(
            "Starting crawl of {} keywords ({} pages)",
            self.input.len(),
            expected
        );

        let (tx, rx) = mpsc::channel(self.options.channel_capacity.max(1));
        let tracker = CompletionTracker::new(expected);
        let limiter = self
            .options
            .max_concurrent_parses
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let dispatcher = Dispatcher {
            input: Arc::clone(&self.input),
            parser: Arc::clone(&self.parser),
            fetcher: self.fetcher.clone(),
            limiter,
            max_page_number: self.options.max_page_number,
            tracker,
            tx,
        };
        let dispatch_handle = tokio::spawn(dispatcher.run());

        let reducer = Reducer::new(expected, self.options.max_result_index)
            .run(rx)
            .await;

        if let Err(e) = dispatch_handle.await {
            tracing::error!("Dispatcher terminated abnormally: {}", e);
        }

        let (results, failures, stats) = reducer.finish();
        let finished_at = Utc::now();

        if !stats.is_fully_accounted() {
            tracing::error!(
                "Crawl accounted for {} of {} tasks",
                stats.accounted(),
                stats.expected
            );
        }

        tracing::info!(
            "Crawl finished: {} results, {} pages completed, {} failed in {}ms",
            results.len(),
            stats.completed,
            stats.failed,
            (finished_at - started_at).num_milliseconds()
        );

        CrawlReport {
            results,
            failures,
            stats,
            started_at,
            finished_at,
        }
    }
}
