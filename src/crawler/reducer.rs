//! Fan-in stage of the crawl
//!
//! The reducer is the only consumer of the crawl channel and the only writer
//! of the result table. It places every tagged result by its coordinates, so
//! the order in which parse tasks finish does not affect the final table.

use crate::crawler::table::ResultTable;
use crate::crawler::types::{CrawlEvent, CrawlFailure, TaggedResult};
use serde::Serialize;
use tokio::sync::mpsc;

/// Counters collected while reducing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Number of (keyword, page) tasks enumerated
    pub expected: usize,
    /// Tasks whose page was parsed
    pub completed: usize,
    /// Tasks that ended with a failure
    pub failed: usize,
    /// Tagged results received
    pub results_received: usize,
    /// Tagged results that replaced an earlier result at the same slot
    pub results_overwritten: usize,
    /// Tagged results dropped for an out-of-range index
    pub results_rejected: usize,
}

impl CrawlStats {
    /// Number of tasks that have reported an outcome
    pub fn accounted(&self) -> usize {
        self.completed + self.failed
    }

    /// Returns true if every enumerated task reported exactly one outcome
    pub fn is_fully_accounted(&self) -> bool {
        self.accounted() == self.expected
    }
}

/// Accumulates crawl events into results, failures and counters
#[derive(Debug)]
pub struct Reducer {
    results: ResultTable,
    failures: Vec<CrawlFailure>,
    stats: CrawlStats,
    max_result_index: usize,
}

impl Reducer {
    /// Creates a reducer expecting `expected` tasks
    pub fn new(expected: usize, max_result_index: usize) -> Self {
        Self {
            results: ResultTable::new(),
            failures: Vec::new(),
            stats: CrawlStats {
                expected,
                ..CrawlStats::default()
            },
            max_result_index,
        }
    }

    /// Drains the channel until every sender has been dropped
    pub async fn run(mut self, mut rx: mpsc::Receiver<CrawlEvent>) -> Self {
        while let Some(event) = rx.recv().await {
            self.apply(event);
        }
        self
    }

    /// Applies a single event
    pub fn apply(&mut self, event: CrawlEvent) {
        match event {
            CrawlEvent::Found(tagged) => self.place(tagged),
            CrawlEvent::Completed {
                keyword,
                page,
                emitted,
            } => {
                self.stats.completed += 1;
                tracing::trace!(keyword = %keyword, page, emitted, "task completed");
            }
            CrawlEvent::Failed(failure) => {
                self.stats.failed += 1;
                self.failures.push(failure);
            }
        }
    }

    fn place(&mut self, tagged: TaggedResult) {
        self.stats.results_received += 1;

        if tagged.index > self.max_result_index {
            self.stats.results_rejected += 1;
            tracing::warn!(
                "Dropping result for '{}' page {} at index {} (max {})",
                tagged.keyword,
                tagged.page,
                tagged.index,
                self.max_result_index
            );
            return;
        }

        tracing::trace!(
            keyword = %tagged.keyword,
            page = tagged.page,
            index = tagged.index,
            "placing result"
        );

        if self.results.insert(tagged).is_some() {
            self.stats.results_overwritten += 1;
        }
    }

    /// Splits the reducer into its parts
    pub fn finish(self) -> (ResultTable, Vec<CrawlFailure>, CrawlStats) {
        (self.results, self.failures, self.stats)
    }
}
