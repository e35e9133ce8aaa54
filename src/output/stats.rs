//! Statistics derived from a crawl report
//!
//! This module condenses a [`CrawlReport`] into counters and prints them
//! for the command line.

use crate::crawler::{CrawlReport, FailureKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatistics {
    /// Keywords that received at least one result
    pub keywords_with_results: usize,

    /// Pages requested across all keywords
    pub pages_requested: usize,

    /// Pages fetched and parsed
    pub pages_completed: usize,

    /// Pages that failed
    pub pages_failed: usize,

    /// Results placed in the table
    pub results: usize,

    /// Empty slots in the positional view
    pub placeholders: usize,

    /// Failure count per failure kind
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
}

impl CrawlStatistics {
    /// Share of requested pages that completed, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_requested == 0 {
            return 0.0;
        }
        (self.pages_completed as f64 / self.pages_requested as f64) * 100.0
    }
}

/// Computes statistics for a finished crawl
pub fn load_statistics(report: &CrawlReport) -> CrawlStatistics {
    let nested = report.nested();
    let placeholders = nested
        .values()
        .flatten()
        .flatten()
        .filter(|result| result.is_placeholder())
        .count();

    let mut failures_by_kind = BTreeMap::new();
    for failure in &report.failures {
        *failures_by_kind.entry(failure.kind).or_insert(0) += 1;
    }

    CrawlStatistics {
        keywords_with_results: nested.len(),
        pages_requested: report.stats.expected,
        pages_completed: report.stats.completed,
        pages_failed: report.stats.failed,
        results: report.results.len(),
        placeholders,
        failures_by_kind,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages requested: {}", stats.pages_requested);
    println!("  Pages completed: {}", stats.pages_completed);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Keywords with results: {}", stats.keywords_with_results);
    println!("  Results: {}", stats.results);
    println!("  Placeholder slots: {}", stats.placeholders);
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failures by Kind:");
        for (kind, count) in &stats.failures_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        stats.success_rate(),
        stats.pages_completed,
        stats.pages_requested
    );
}
