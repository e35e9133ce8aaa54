//! Per-crawl completion accounting
//!
//! A [`CompletionTracker`] is created for one crawl, sized to the number of
//! (keyword, page) tasks it will enumerate. Every task holds a
//! [`CompletionGuard`]; dropping the guard records that task as finished,
//! so a task is counted exactly once whether it succeeded, failed, or
//! panicked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug)]
struct Inner {
    remaining: AtomicUsize,
    notify: Notify,
}

/// Counts outstanding tasks of a single crawl
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    inner: Arc<Inner>,
}

impl CompletionTracker {
    /// Creates a tracker expecting `expected` tasks
    pub fn new(expected: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                remaining: AtomicUsize::new(expected),
                notify: Notify::new(),
            }),
        }
    }

    /// Number of tasks that have not finished yet
    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Hands out the guard for one task
    pub fn guard(&self) -> CompletionGuard {
        CompletionGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Waits until every expected task has finished
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a finish between the check and the
            // await is not missed.
            notified.as_mut().enable();

            if self.remaining() == 0 {
                return;
            }

            notified.await;
        }
    }
}

/// Marks one task finished when dropped
#[derive(Debug)]
pub struct CompletionGuard {
    inner: Arc<Inner>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let previous = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.inner.notify.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::error!("completion guard dropped after all tasks were accounted for"),
        }
    }
}
