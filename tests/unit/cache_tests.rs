/*!
 * Tests for transcript cache functionality
 */

use std::time::Duration;

use capfetch::app_config::CacheConfig;
use capfetch::cache::TranscriptCache;

use crate::common::{transcript, VIDEO_A, VIDEO_B, VIDEO_C};

fn cache_with(max_entries: usize, ttl_secs: u64) -> TranscriptCache {
    TranscriptCache::new(&CacheConfig {
        max_entries,
        ttl_secs,
    })
}

#[tokio::test]
async fn test_cache_get_withMissingFingerprint_shouldReturnNone() {
    let cache = cache_with(10, 3600);
    assert!(cache.get(VIDEO_A, Some("en")).is_none());
}

#[tokio::test]
async fn test_cache_set_withFingerprint_shouldReturnStoredTranscript() {
    let cache = cache_with(10, 3600);
    cache.set(VIDEO_A, Some("en"), transcript(VIDEO_A, "en", 10.0));

    let hit = cache.get(VIDEO_A, Some("en")).unwrap();
    assert_eq!(hit.video_id, VIDEO_A);
    assert_eq!(hit.language, "en");
}

#[tokio::test]
async fn test_cache_get_withDifferentLanguage_shouldReturnNone() {
    let cache = cache_with(10, 3600);
    cache.set(VIDEO_A, Some("en"), transcript(VIDEO_A, "en", 10.0));

    assert!(cache.get(VIDEO_A, Some("fr")).is_none());
    assert!(cache.get(VIDEO_A, None).is_none());
}

#[tokio::test]
async fn test_cache_set_withSameFingerprint_shouldReplaceNotDuplicate() {
    let cache = cache_with(10, 3600);
    cache.set(VIDEO_A, Some("en"), transcript(VIDEO_A, "en", 10.0));
    cache.set(VIDEO_A, Some("en"), transcript(VIDEO_A, "en", 99.0));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(VIDEO_A, Some("en")).unwrap().duration_seconds, 99.0);
}

#[tokio::test]
async fn test_cache_set_beyondCapacity_shouldEvictLeastRecentlyUsed() {
    let cache = cache_with(2, 3600);
    cache.set(VIDEO_A, None, transcript(VIDEO_A, "en", 1.0));
    cache.set(VIDEO_B, None, transcript(VIDEO_B, "en", 2.0));
    cache.set(VIDEO_C, None, transcript(VIDEO_C, "en", 3.0));

    assert!(cache.get(VIDEO_A, None).is_none());
    assert!(cache.get(VIDEO_B, None).is_some());
    assert!(cache.get(VIDEO_C, None).is_some());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_cache_get_shouldRefreshRecencyForEviction() {
    let cache = cache_with(2, 3600);
    cache.set(VIDEO_A, None, transcript(VIDEO_A, "en", 1.0));
    cache.set(VIDEO_B, None, transcript(VIDEO_B, "en", 2.0));

    // Touch A so B becomes the least recently used entry
    assert!(cache.get(VIDEO_A, None).is_some());
    cache.set(VIDEO_C, None, transcript(VIDEO_C, "en", 3.0));

    assert!(cache.get(VIDEO_A, None).is_some());
    assert!(cache.get(VIDEO_B, None).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cache_get_withExpiredEntry_shouldTreatAsAbsent() {
    let cache = cache_with(10, 60);
    cache.set(VIDEO_A, Some("en"), transcript(VIDEO_A, "en", 10.0));

    tokio::time::sleep(Duration::from_secs(61)).await;

    assert!(cache.get(VIDEO_A, Some("en")).is_none());
    // Expired entries are physically removed on lookup
    assert_eq!(cache.stats().size, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cache_get_withFreshEntry_shouldHitBeforeTtl() {
    let cache = cache_with(10, 60);
    cache.set(VIDEO_A, Some("en"), transcript(VIDEO_A, "en", 10.0));

    tokio::time::sleep(Duration::from_secs(59)).await;

    assert!(cache.get(VIDEO_A, Some("en")).is_some());
}

#[tokio::test]
async fn test_cache_stats_shouldCountHitsAndMisses() {
    let cache = cache_with(10, 3600);
    cache.set(VIDEO_A, None, transcript(VIDEO_A, "en", 1.0));

    cache.get(VIDEO_A, None);
    cache.get(VIDEO_B, None);
    cache.get(VIDEO_B, None);

    let stats = cache.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.max_entries, 10);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[tokio::test]
async fn test_cache_clear_shouldDropEntriesAndResetCounters() {
    let cache = cache_with(10, 3600);
    cache.set(VIDEO_A, None, transcript(VIDEO_A, "en", 1.0));
    cache.get(VIDEO_A, None);

    cache.clear();

    assert!(cache.is_empty());
    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
}

#[tokio::test]
async fn test_cache_clone_shouldShareStorage() {
    let cache = cache_with(10, 3600);
    let other = cache.clone();
    cache.set(VIDEO_A, None, transcript(VIDEO_A, "en", 1.0));

    assert!(other.get(VIDEO_A, None).is_some());
}
