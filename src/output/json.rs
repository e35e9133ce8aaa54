//! JSON export of crawl results

use crate::crawler::{CrawlFailure, CrawlReport, CrawlStats, NestedResults};
use crate::output::OutputResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serialized form of a crawl report
///
/// `results` uses the positional keyword → pages → results shape.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: &'a CrawlStats,
    pub results: NestedResults,
    pub failures: &'a [CrawlFailure],
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a CrawlReport) -> Self {
        Self {
            started_at: report.started_at,
            finished_at: report.finished_at,
            stats: &report.stats,
            results: report.nested(),
            failures: &report.failures,
        }
    }
}

/// Renders a report as pretty-printed JSON
pub fn to_json_string(report: &CrawlReport) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::new(report))?)
}

/// Writes a report as JSON to `output_path`
pub fn write_json_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(writer, &JsonReport::new(report))?;
    Ok(())
}
