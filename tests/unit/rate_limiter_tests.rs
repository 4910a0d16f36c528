/*!
 * Tests for the windowed admission gate
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use capfetch::app_config::RateLimitConfig;
use capfetch::rate_limiter::RateLimiter;

fn limiter_config(max_requests: usize, window_ms: u64, max_concurrency: usize) -> RateLimitConfig {
    RateLimitConfig {
        max_requests,
        window_ms,
        max_concurrency,
        backoff_ms: 50,
    }
}

#[tokio::test(start_paused = true)]
async fn test_rateLimiter_admit_withExhaustedWindow_shouldDelayNotReject() {
    let limiter = RateLimiter::new(&limiter_config(2, 1000, 8));
    let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

    let operations = (0..5).map(|_| {
        let starts = starts.clone();
        limiter.admit(async move {
            starts.lock().unwrap().push(Instant::now());
        })
    });
    futures::future::join_all(operations).await;

    let mut starts = starts.lock().unwrap().clone();
    starts.sort();
    assert_eq!(starts.len(), 5, "no operation may be dropped or rejected");

    // At most 2 starts within any sliding 1-second window
    for pair in starts.windows(3) {
        assert!(
            pair[2] - pair[0] >= Duration::from_millis(1000),
            "three starts fell within one window: {:?}",
            pair
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_rateLimiter_admit_withConcurrencyCap_shouldBoundInFlight() {
    let limiter = RateLimiter::new(&limiter_config(100, 1000, 2));
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let operations = (0..6).map(|_| {
        let active = active.clone();
        let max_seen = max_seen.clone();
        limiter.admit(async move {
            let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now_active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            active.fetch_sub(1, Ordering::SeqCst);
        })
    });
    futures::future::join_all(operations).await;

    assert!(max_seen.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_rateLimiter_status_whenIdle_shouldReportFullQuota() {
    let limiter = RateLimiter::new(&limiter_config(10, 1000, 4));

    let status = limiter.status();
    assert_eq!(status.limit, 10);
    assert_eq!(status.remaining, 10);
    assert_eq!(status.reset_in_ms, 0);
    assert_eq!(status.in_flight, 0);
    assert_eq!(status.queued, 0);
}

#[tokio::test(start_paused = true)]
async fn test_rateLimiter_status_afterAdmission_shouldReportConsumedQuota() {
    let limiter = RateLimiter::new(&limiter_config(10, 1000, 4));

    limiter.admit(async {}).await;
    limiter.admit(async {}).await;

    let status = limiter.status();
    assert_eq!(status.remaining, 8);
    assert!(status.reset_in_ms <= 1000);
    assert_eq!(status.in_flight, 0);
}

#[tokio::test(start_paused = true)]
async fn test_rateLimiter_status_afterWindowElapsed_shouldRestoreQuota() {
    let limiter = RateLimiter::new(&limiter_config(2, 1000, 4));

    limiter.admit(async {}).await;
    limiter.admit(async {}).await;
    assert_eq!(limiter.status().remaining, 0);

    tokio::time::sleep(Duration::from_millis(1001)).await;
    assert_eq!(limiter.status().remaining, 2);
}

#[test]
fn test_rateLimiter_admit_shouldReturnOperationOutput() {
    let limiter = RateLimiter::new(&limiter_config(10, 1000, 4));

    let value = tokio_test::block_on(limiter.admit(async { 41 + 1 }));
    assert_eq!(value, 42);
}

#[tokio::test(start_paused = true)]
async fn test_rateLimiter_status_afterCancelledAdmission_shouldNotLeakCounters() {
    let limiter = Arc::new(RateLimiter::new(&limiter_config(10, 1000, 1)));

    // Occupy the single concurrency slot indefinitely
    let running = tokio::spawn({
        let limiter = limiter.clone();
        async move { limiter.admit(std::future::pending::<()>()).await }
    });
    tokio::task::yield_now().await;
    assert_eq!(limiter.status().in_flight, 1);

    // A second admission queues behind the occupied slot
    let waiting = tokio::spawn({
        let limiter = limiter.clone();
        async move { limiter.admit(async {}).await }
    });
    tokio::task::yield_now().await;
    assert_eq!(limiter.status().queued, 1);

    waiting.abort();
    let _ = waiting.await;
    assert_eq!(limiter.status().queued, 0, "cancelled waiter must not stay counted");

    running.abort();
    let _ = running.await;
    assert_eq!(limiter.status().in_flight, 0, "cancelled operation must not stay counted");
}
