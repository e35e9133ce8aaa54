//! Fan-out stage of the crawl
//!
//! The dispatcher walks every configured (keyword, page) pair in order:
//! - Rejects page numbers above the configured maximum
//! - Builds the page URL with the parser
//! - Fetches the page and reads it into a [`Document`] (one fetch at a time)
//! - Spawns one parse task per fetched page, optionally bounded by a semaphore
//! - Reports a classified failure for every page it could not fetch
//!
//! Every pair holds a [`CompletionGuard`] until its final event is sent.
//! Once all guards are released the dispatcher drops its sender, and the
//! channel closes as soon as the last parse task has finished.

use crate::crawler::completion::{CompletionGuard, CompletionTracker};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{Document, ResultSink, SearchParser};
use crate::crawler::types::{CrawlEvent, CrawlFailure, FailureKind};
use crate::crawler::CrawlInput;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

/// Everything one dispatch run needs
pub(crate) struct Dispatcher<P: SearchParser> {
    pub input: Arc<CrawlInput>,
    pub parser: Arc<P>,
    pub fetcher: Fetcher,
    pub limiter: Option<Arc<Semaphore>>,
    pub max_page_number: u32,
    pub tracker: CompletionTracker,
    pub tx: mpsc::Sender<CrawlEvent>,
}

impl<P: SearchParser> Dispatcher<P> {
    /// Runs the dispatch loop to completion
    pub async fn run(self) {
        let Dispatcher {
            input,
            parser,
            fetcher,
            limiter,
            max_page_number,
            tracker,
            tx,
        } = self;

        let mut spawned = 0usize;
        let mut failed = 0usize;

        for (keyword, pages) in input.iter() {
            tracing::debug!("Dispatching {} pages for '{}'", pages.len(), keyword);

            for &page in pages {
                let guard = tracker.guard();

                if page > max_page_number {
                    failed += 1;
                    let failure = CrawlFailure::new(
                        keyword.as_str(),
                        page,
                        FailureKind::Request,
                        format!("page {} exceeds max page number {}", page, max_page_number),
                    );
                    tracing::warn!("Skipping page: {}", failure);
                    send_event(&tx, CrawlEvent::Failed(failure)).await;
                    drop(guard);
                    continue;
                }

                let url = parser.search_url(keyword, page);
                tracing::debug!(keyword = %keyword, page, url = %url, "fetching search page");

                let document = match load_document(&fetcher, &url, keyword, page).await {
                    Ok(document) => document,
                    Err(failure) => {
                        failed += 1;
                        tracing::warn!("Skipping page: {}", failure);
                        send_event(&tx, CrawlEvent::Failed(failure)).await;
                        drop(guard);
                        continue;
                    }
                };

                let permit = match &limiter {
                    Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
                    None => None,
                };

                spawn_parse_task(ParseTask {
                    parser: Arc::clone(&parser),
                    document,
                    keyword: keyword.clone(),
                    page,
                    tx: tx.clone(),
                    guard,
                    permit,
                });
                spawned += 1;
            }
        }

        tracing::debug!(
            "Dispatch finished: {} parse tasks spawned, {} pages failed; waiting for {} outstanding",
            spawned,
            failed,
            tracker.remaining()
        );

        tracker.wait().await;
        drop(tx);
    }
}

/// Fetches a page and turns it into a document
async fn load_document(
    fetcher: &Fetcher,
    url: &str,
    keyword: &str,
    page: u32,
) -> Result<Document, CrawlFailure> {
    let body = fetcher
        .fetch(url)
        .await
        .map_err(|e| CrawlFailure::new(keyword, page, e.kind(), e.to_string()))?;
    Document::from_reader(url, body)
        .map_err(|e| CrawlFailure::new(keyword, page, e.kind(), e.to_string()))
}

/// A parse job for one fetched page
struct ParseTask<P: SearchParser> {
    parser: Arc<P>,
    document: Document,
    keyword: String,
    page: u32,
    tx: mpsc::Sender<CrawlEvent>,
    guard: CompletionGuard,
    permit: Option<OwnedSemaphorePermit>,
}

/// Spawns the parse task for one page
///
/// The parser itself runs on the blocking pool. The task always ends by
/// sending exactly one `Completed` or `Failed` event, then releases its
/// permit and completion guard.
fn spawn_parse_task<P: SearchParser>(task: ParseTask<P>) {
    let ParseTask {
        parser,
        document,
        keyword,
        page,
        tx,
        guard,
        permit,
    } = task;

    tokio::spawn(async move {
        let _guard = guard;
        let _permit = permit;

        let sink = ResultSink::new(tx.clone(), keyword.clone(), page);
        let parse_keyword = keyword.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let result = parser.parse(&document, &parse_keyword, page, &sink);
            (result, sink.emitted())
        })
        .await;

        let event = match outcome {
            Ok((Ok(()), emitted)) => {
                tracing::debug!(keyword = %keyword, page, emitted, "page parsed");
                CrawlEvent::Completed {
                    keyword,
                    page,
                    emitted,
                }
            }
            Ok((Err(err), emitted)) => {
                let failure = CrawlFailure::new(keyword, page, err.kind(), err.to_string());
                tracing::warn!("Parse failed after {} results: {}", emitted, failure);
                CrawlEvent::Failed(failure)
            }
            Err(join_err) => {
                let failure =
                    CrawlFailure::new(keyword, page, FailureKind::Panicked, join_err.to_string());
                tracing::error!("Parse task aborted: {}", failure);
                CrawlEvent::Failed(failure)
            }
        };

        send_event(&tx, event).await;
    });
}

async fn send_event(tx: &mpsc::Sender<CrawlEvent>, event: CrawlEvent) {
    if tx.send(event).await.is_err() {
        tracing::debug!("Reducer is gone; dropping crawl event");
    }
}
