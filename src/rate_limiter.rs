/*!
 * Windowed admission gate for extraction operations.
 *
 * Two independent constraints: a semaphore caps how many operations run in
 * flight at once, and a rolling window caps how many may be *started*
 * within any `window_ms` span. An exhausted window delays admission and
 * re-evaluates; there is no hard-reject path for transient overload.
 */

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};

use crate::app_config::RateLimitConfig;

/// Rate limiter status snapshot for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    /// Maximum starts per rolling window
    pub limit: usize,
    /// Starts still available in the current window
    pub remaining: usize,
    /// Milliseconds until the oldest recorded start leaves the window
    pub reset_in_ms: u64,
    /// Operations currently past admission and running
    pub in_flight: usize,
    /// Operations waiting for admission
    pub queued: usize,
}

/// Counter bump reverted on drop, so a caller dropping an `admit` future
/// mid-wait cannot skew the status snapshot
struct CounterGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> CounterGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for CounterGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sliding-window rate limiter with an independent concurrency cap
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    backoff: Duration,
    semaphore: Semaphore,
    /// Start times of admitted operations, oldest first
    starts: Mutex<VecDeque<Instant>>,
    in_flight: AtomicUsize,
    queued: AtomicUsize,
}

impl RateLimiter {
    /// Create a new limiter from configuration
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests.max(1),
            window: config.window(),
            backoff: config.backoff(),
            semaphore: Semaphore::new(config.max_concurrency.max(1)),
            starts: Mutex::new(VecDeque::new()),
            in_flight: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
        }
    }

    /// Run `operation` once both the concurrency cap and the window quota
    /// admit it. Admission may suspend; it never rejects.
    pub async fn admit<F, T>(&self, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let waiting = CounterGuard::enter(&self.queued);

        // The semaphore is never closed, acquire cannot fail
        let _permit = self.semaphore.acquire().await.unwrap();
        self.wait_for_window_slot().await;
        drop(waiting);

        let _running = CounterGuard::enter(&self.in_flight);
        operation.await
    }

    /// Block until the rolling window has a free start slot, recording the
    /// start time once it does
    async fn wait_for_window_slot(&self) {
        loop {
            let wait = {
                let mut starts = self.starts.lock();
                let now = Instant::now();
                Self::prune_window(&mut starts, now, self.window);

                if starts.len() < self.max_requests {
                    starts.push_back(now);
                    None
                } else {
                    // Oldest start leaving the window frees the next slot;
                    // never re-evaluate sooner than the configured backoff
                    let oldest = *starts.front().unwrap();
                    let until_free = self
                        .window
                        .checked_sub(now.duration_since(oldest))
                        .unwrap_or(Duration::ZERO);
                    Some(until_free.max(self.backoff))
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    debug!(
                        "Rate limit window exhausted ({} starts), delaying admission {:?}",
                        self.max_requests, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn prune_window(starts: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = starts.front() {
            if now.duration_since(*front) >= window {
                starts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Snapshot the remaining quota, reset time and queue depths
    pub fn status(&self) -> RateLimitStatus {
        let mut starts = self.starts.lock();
        let now = Instant::now();
        Self::prune_window(&mut starts, now, self.window);

        let reset_in_ms = starts
            .front()
            .map(|oldest| {
                self.window
                    .checked_sub(now.duration_since(*oldest))
                    .unwrap_or(Duration::ZERO)
                    .as_millis() as u64
            })
            .unwrap_or(0);

        RateLimitStatus {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(starts.len()),
            reset_in_ms,
            in_flight: self.in_flight.load(Ordering::SeqCst),
            queued: self.queued.load(Ordering::SeqCst),
        }
    }
}
