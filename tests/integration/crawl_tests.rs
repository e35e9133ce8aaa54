//! Integration tests for the crawler
//!
//! These tests use wiremock to serve search result pages and run the
//! full fetch → parse → reduce cycle end-to-end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sumi_serp::config::{parse_config, UserAgentConfig};
use sumi_serp::crawler::{
    crawl, CrawlInput, CrawlOptions, CrawlReport, Crawler, Document, FailureKind, Fetcher,
    ParseError, ResultSink, SearchParser, SearchResult,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Parses bodies made of `title|url` lines
struct LineParser {
    base: String,
}

impl LineParser {
    fn new(server: &MockServer) -> Self {
        Self {
            base: server.uri(),
        }
    }
}

fn emit_lines(document: &Document, sink: &ResultSink) -> Result<(), ParseError> {
    let lines = document.text().lines().filter(|l| !l.trim().is_empty());
    for (index, line) in lines.enumerate() {
        let (title, url) = line
            .split_once('|')
            .ok_or_else(|| ParseError::Extraction(format!("malformed line '{}'", line)))?;
        sink.emit(index, SearchResult::new(title.trim(), url.trim(), ""))?;
    }
    Ok(())
}

impl SearchParser for LineParser {
    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!("{}/{}/{}", self.base, keyword, page)
    }

    fn parse(
        &self,
        document: &Document,
        _keyword: &str,
        _page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError> {
        emit_lines(document, sink)
    }
}

/// Mounts a page body at `/{keyword}/{page}`
async fn mount_page(server: &MockServer, keyword: &str, page: u32, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/{}", keyword, page)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

fn fetcher() -> Fetcher {
    Fetcher::new(&UserAgentConfig::default()).expect("Failed to build fetcher")
}

fn input(entries: &[(&str, &[u32])]) -> CrawlInput {
    entries
        .iter()
        .map(|(keyword, pages)| (keyword.to_string(), pages.to_vec()))
        .collect()
}

fn titles(report: &CrawlReport, keyword: &str) -> Vec<Vec<String>> {
    report
        .nested()
        .get(keyword)
        .map(|pages| {
            pages
                .iter()
                .map(|results| results.iter().map(|r| r.title.clone()).collect())
                .collect()
        })
        .unwrap_or_default()
}

async fn run_with_timeout<P: SearchParser>(crawler: &Crawler<P>) -> CrawlReport {
    tokio::time::timeout(Duration::from_secs(30), crawler.start())
        .await
        .expect("Crawl did not finish")
}

#[tokio::test]
async fn test_results_ordered_by_keyword_page_and_index() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "A|url-a\nB|url-b").await;
    mount_page(&server, "cats", 1, "C|url-c").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 1])]),
        LineParser::new(&server),
        fetcher(),
    );
    let report = run_with_timeout(&crawler).await;

    assert!(report.is_complete());
    assert_eq!(
        titles(&report, "cats"),
        vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]]
    );

    let nested = report.nested();
    assert_eq!(nested["cats"][0][1].url, "url-b");
    assert_eq!(report.stats.completed, 2);
    assert_eq!(report.stats.results_received, 3);
}

/// Sleeps longer for earlier pages so completions arrive out of order
struct SlowLineParser {
    base: String,
}

impl SearchParser for SlowLineParser {
    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!("{}/{}/{}", self.base, keyword, page)
    }

    fn parse(
        &self,
        document: &Document,
        keyword: &str,
        page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError> {
        let delay = (6 - page as u64) * 5 + (keyword.len() as u64 % 3) * 7;
        std::thread::sleep(Duration::from_millis(delay));
        emit_lines(document, sink)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_independent_of_completion_timing() {
    let server = MockServer::start().await;
    let keywords = ["ant", "bees", "crabs", "doves"];

    for keyword in keywords {
        for page in 0..6u32 {
            let body: Vec<String> = (0..3)
                .map(|i| format!("{}-{}-{}|https://{}.example/{}/{}", keyword, page, i, keyword, page, i))
                .collect();
            mount_page(&server, keyword, page, &body.join("\n")).await;
        }
    }

    let pages: Vec<u32> = (0..6).collect();
    let crawl_input: CrawlInput = keywords
        .iter()
        .map(|k| (k.to_string(), pages.clone()))
        .collect();

    let crawler = Crawler::new(
        crawl_input,
        SlowLineParser {
            base: server.uri(),
        },
        fetcher(),
    );
    let report = run_with_timeout(&crawler).await;

    assert!(report.is_complete());
    for keyword in keywords {
        let got = titles(&report, keyword);
        assert_eq!(got.len(), 6);
        for (page, results) in got.iter().enumerate() {
            let expected: Vec<String> = (0..3)
                .map(|i| format!("{}-{}-{}", keyword, page, i))
                .collect();
            assert_eq!(results, &expected);
        }
    }
}

#[tokio::test]
async fn test_repeated_crawls_are_identical() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "A|url-a\nB|url-b").await;
    mount_page(&server, "cats", 2, "C|url-c").await;
    mount_page(&server, "dogs", 0, "D|url-d").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 2]), ("dogs", &[0])]),
        LineParser::new(&server),
        fetcher(),
    );

    let first = run_with_timeout(&crawler).await;
    let second = run_with_timeout(&crawler).await;

    assert_eq!(first.nested(), second.nested());
    assert_eq!(first.stats, second.stats);
}

#[tokio::test]
async fn test_concurrent_crawls_on_one_crawler() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "A|url-a").await;
    mount_page(&server, "cats", 1, "B|url-b").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 1])]),
        LineParser::new(&server),
        fetcher(),
    );

    let (first, second) = tokio::join!(crawler.start(), crawler.start());

    assert_eq!(first.nested(), second.nested());
    assert_eq!(first.results.len(), 2);
}

#[tokio::test]
async fn test_keyword_with_no_pages_has_no_entry() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "A|url-a").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0]), ("dogs", &[])]),
        LineParser::new(&server),
        fetcher(),
    );
    let report = run_with_timeout(&crawler).await;

    assert_eq!(report.stats.expected, 1);
    assert!(report.nested().get("dogs").is_none());
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_empty_input_returns_immediately() {
    let server = MockServer::start().await;

    let crawler = Crawler::new(CrawlInput::new(), LineParser::new(&server), fetcher());
    let report = run_with_timeout(&crawler).await;

    assert!(report.results.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.stats.expected, 0);
}

#[tokio::test]
async fn test_sparse_pages_leave_empty_interior() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 3, "A|url-a").await;

    let crawler = Crawler::new(input(&[("cats", &[3])]), LineParser::new(&server), fetcher());
    let report = run_with_timeout(&crawler).await;

    let pages = titles(&report, "cats");
    assert_eq!(pages.len(), 4);
    assert!(pages[..3].iter().all(Vec::is_empty));
    assert_eq!(pages[3], vec!["A".to_string()]);
}

#[tokio::test]
async fn test_empty_page_body_completes_without_results() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "").await;

    let crawler = Crawler::new(input(&[("cats", &[0])]), LineParser::new(&server), fetcher());
    let report = run_with_timeout(&crawler).await;

    assert!(report.is_complete());
    assert_eq!(report.stats.completed, 1);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_error_status_is_still_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cats/0"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Busy|url-busy"))
        .mount(&server)
        .await;

    let crawler = Crawler::new(input(&[("cats", &[0])]), LineParser::new(&server), fetcher());
    let report = run_with_timeout(&crawler).await;

    assert_eq!(titles(&report, "cats"), vec![vec!["Busy".to_string()]]);
}

/// Titles every parsed page with the order in which it was parsed
struct CountingParser {
    base: String,
    calls: AtomicUsize,
}

impl SearchParser for CountingParser {
    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!("{}/{}/{}", self.base, keyword, page)
    }

    fn parse(
        &self,
        _document: &Document,
        _keyword: &str,
        _page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        sink.emit(0, SearchResult::new(format!("call-{}", call), "url", ""))
    }
}

#[tokio::test]
async fn test_duplicate_page_last_write_wins() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "ignored").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 0])]),
        CountingParser {
            base: server.uri(),
            calls: AtomicUsize::new(0),
        },
        fetcher(),
    )
    .with_options(CrawlOptions {
        max_concurrent_parses: Some(1),
        ..CrawlOptions::default()
    });
    let report = run_with_timeout(&crawler).await;

    assert_eq!(report.stats.completed, 2);
    assert_eq!(report.stats.results_overwritten, 1);
    assert_eq!(titles(&report, "cats"), vec![vec!["call-1".to_string()]]);
}

/// Fails in a different way for each special keyword
struct FlakyParser {
    base: String,
}

impl SearchParser for FlakyParser {
    fn search_url(&self, keyword: &str, page: u32) -> String {
        if keyword == "offline" {
            // Nothing listens on port 1
            return format!("http://127.0.0.1:1/{}/{}", keyword, page);
        }
        format!("{}/{}/{}", self.base, keyword, page)
    }

    fn parse(
        &self,
        document: &Document,
        keyword: &str,
        _page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError> {
        match keyword {
            "broken" => {
                sink.emit(0, SearchResult::new("Partial", "url-partial", ""))?;
                Err(ParseError::Extraction("unexpected markup".to_string()))
            }
            "panics" => panic!("parser bug"),
            _ => emit_lines(document, sink),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failures_are_reported_and_isolated() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "A|url-a").await;
    mount_page(&server, "cats", 1, "B|url-b").await;
    mount_page(&server, "broken", 0, "whatever").await;
    mount_page(&server, "panics", 0, "whatever").await;

    let crawler = Crawler::new(
        input(&[
            ("broken", &[0]),
            ("cats", &[0, 1]),
            ("offline", &[0, 1]),
            ("panics", &[0]),
        ]),
        FlakyParser {
            base: server.uri(),
        },
        fetcher(),
    );
    let report = run_with_timeout(&crawler).await;

    assert!(!report.is_complete());
    assert!(report.stats.is_fully_accounted());
    assert_eq!(report.stats.expected, 6);
    assert_eq!(report.stats.completed, 2);
    assert_eq!(report.stats.failed, 4);

    // Healthy keyword unaffected
    assert_eq!(
        titles(&report, "cats"),
        vec![vec!["A".to_string()], vec!["B".to_string()]]
    );

    // Both offline pages attempted and reported
    let offline: Vec<_> = report
        .failures
        .iter()
        .filter(|f| f.keyword == "offline")
        .collect();
    assert_eq!(offline.len(), 2);
    assert!(offline.iter().all(|f| f.kind == FailureKind::Transport));

    let broken: Vec<_> = report.failures_for("broken", 0).collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].kind, FailureKind::Extraction);
    // Results emitted before the failure are kept
    assert_eq!(titles(&report, "broken"), vec![vec!["Partial".to_string()]]);

    let panicked: Vec<_> = report.failures_for("panics", 0).collect();
    assert_eq!(panicked.len(), 1);
    assert_eq!(panicked[0].kind, FailureKind::Panicked);
}

#[tokio::test]
async fn test_invalid_utf8_bytes_do_not_lose_results() {
    let server = MockServer::start().await;
    let mut body = b"A|url-a\nB|url-b\n".to_vec();
    body.extend_from_slice(b"Caf\xe9|url-cafe\n");
    Mock::given(method("GET"))
        .and(path("/cats/0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;
    mount_page(&server, "cats", 1, "D|url-d").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 1])]),
        LineParser::new(&server),
        fetcher(),
    );
    let report = run_with_timeout(&crawler).await;

    assert!(report.is_complete());
    assert_eq!(
        titles(&report, "cats"),
        vec![
            vec!["A".to_string(), "B".to_string(), "Caf\u{FFFD}".to_string()],
            vec!["D".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_pages_above_limit_are_rejected() {
    let server = MockServer::start().await;
    mount_page(&server, "cats", 0, "A|url-a").await;
    mount_page(&server, "cats", 9, "B|url-b").await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 9, 2_000_000])]),
        LineParser::new(&server),
        fetcher(),
    )
    .with_options(CrawlOptions {
        max_page_number: 8,
        ..CrawlOptions::default()
    });
    let report = run_with_timeout(&crawler).await;

    assert!(report.stats.is_fully_accounted());
    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.stats.failed, 2);
    assert_eq!(titles(&report, "cats"), vec![vec!["A".to_string()]]);

    for page in [9, 2_000_000] {
        let failures: Vec<_> = report.failures_for("cats", page).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Request);
    }

    // Rejected pages are never requested
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}

/// Records the highest number of parses running at once
struct GaugeParser {
    base: String,
    running: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

impl SearchParser for GaugeParser {
    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!("{}/{}/{}", self.base, keyword, page)
    }

    fn parse(
        &self,
        document: &Document,
        _keyword: &str,
        _page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(40));
        let result = emit_lines(document, sink);
        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_limit_respected() {
    let server = MockServer::start().await;
    for page in 0..8u32 {
        mount_page(&server, "cats", page, &format!("T{}|url-{}", page, page)).await;
    }

    let peak = Arc::new(AtomicUsize::new(0));
    let crawler = Crawler::new(
        input(&[("cats", &[0, 1, 2, 3, 4, 5, 6, 7])]),
        GaugeParser {
            base: server.uri(),
            running: AtomicUsize::new(0),
            peak: Arc::clone(&peak),
        },
        fetcher(),
    )
    .with_options(CrawlOptions {
        max_concurrent_parses: Some(2),
        ..CrawlOptions::default()
    });
    let report = run_with_timeout(&crawler).await;

    assert!(report.is_complete());
    assert_eq!(report.results.len(), 8);
    let observed = peak.load(Ordering::SeqCst);
    assert!(observed >= 1 && observed <= 2, "peak was {}", observed);
}

#[tokio::test]
async fn test_small_channel_does_not_stall() {
    let server = MockServer::start().await;
    let body: Vec<String> = (0..50).map(|i| format!("T{}|url-{}", i, i)).collect();
    mount_page(&server, "cats", 0, &body.join("\n")).await;
    mount_page(&server, "cats", 1, &body.join("\n")).await;

    let crawler = Crawler::new(
        input(&[("cats", &[0, 1])]),
        LineParser::new(&server),
        fetcher(),
    )
    .with_options(CrawlOptions {
        channel_capacity: 1,
        ..CrawlOptions::default()
    });
    let report = run_with_timeout(&crawler).await;

    assert!(report.is_complete());
    assert_eq!(report.results.len(), 100);
}

const MOCK_SERP_HTML: &str = r#"<html><body>
<div class="hit">
  <a class="title" href="https://cats.example/one">Cats   one</a>
  <p class="snippet">All about the first cat.</p>
</div>
<div class="hit">
  <a class="title" href="/two">Cats two</a>
</div>
<div class="hit">
  <span>No link here</span>
</div>
</body></html>"#;

#[tokio::test]
async fn test_configured_selector_engine_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "big cats"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_SERP_HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "big cats"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let toml = format!(
        r#"
[crawler]
max-concurrent-parses = 2

[engine]
preset = "custom"
url-template = "{uri}/search?q={{keyword}}&page={{page}}"
result-selector = "div.hit"
title-selector = "a.title"
link-selector = "a.title"
description-selector = "p.snippet"

[keywords]
"big cats" = [0, 1]
"#,
        uri = server.uri()
    );
    let config = parse_config(&toml).expect("Failed to parse config");

    let report = tokio::time::timeout(Duration::from_secs(30), crawl(&config))
        .await
        .expect("Crawl did not finish")
        .expect("Crawl could not start");

    assert!(report.is_complete());
    let nested = report.nested();
    let pages = &nested["big cats"];
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].len(), 2);
    assert_eq!(pages[0][0].title, "Cats one");
    assert_eq!(pages[0][0].url, "https://cats.example/one");
    assert_eq!(pages[0][0].description, "All about the first cat.");
    assert_eq!(pages[0][1].url, format!("{}/two", server.uri()));
}
