/*!
 * Common test utilities shared across the test suite
 */


use std::sync::Arc;

use chrono::Utc;

use capfetch::app_config::Config;
use capfetch::extractor::TranscriptExtractor;
use capfetch::transcript::{CaptionTrack, TrackKind, Transcript, TranscriptSegment};

use mock_sources::MockSource;

/// Initialize logging once so `RUST_LOG` works in test runs
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Valid-looking video ids for tests (11 URL-safe characters)
pub const VIDEO_A: &str = "aaaaaaaaaaa";
pub const VIDEO_B: &str = "bbbbbbbbbbb";
pub const VIDEO_C: &str = "ccccccccccc";

/// Configuration with short delays and a wide-open rate limit so tests
/// under a paused clock finish instantly
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.extraction.retry_base_delay_ms = 10;
    config.rate_limit.max_requests = 100;
    config.rate_limit.window_ms = 1_000;
    config.rate_limit.max_concurrency = 8;
    config.rate_limit.backoff_ms = 5;
    config
}

pub fn manual_track(code: &str) -> CaptionTrack {
    CaptionTrack {
        locator: format!("https://captions.test/manual/{}", code),
        language_code: code.to_string(),
        display_name: code.to_string(),
        kind: TrackKind::Manual,
    }
}

pub fn auto_track(code: &str) -> CaptionTrack {
    CaptionTrack {
        locator: format!("https://captions.test/auto/{}", code),
        language_code: code.to_string(),
        display_name: format!("{} (auto-generated)", code),
        kind: TrackKind::AutoGenerated,
    }
}

pub fn segment(text: &str, start_seconds: f64) -> TranscriptSegment {
    TranscriptSegment::new(text, start_seconds, 2.0)
}

/// Bare transcript value for cache and report tests
pub fn transcript(video_id: &str, language: &str, duration_seconds: f64) -> Transcript {
    Transcript {
        video_id: video_id.to_string(),
        title: format!("Video {}", video_id),
        channel: "Test Channel".to_string(),
        duration_seconds,
        language: language.to_string(),
        is_auto_generated: false,
        segments: vec![segment("hello", 0.0)],
        fetched_at: Utc::now(),
    }
}

/// Extractor with the mock backing both collaborator seams
pub fn extractor_over(source: &Arc<MockSource>, config: &Config) -> TranscriptExtractor {
    TranscriptExtractor::new(source.clone(), source.clone(), config)
}
