/*!
 * # capfetch, a caption extraction pipeline
 *
 * A Rust library for extracting time-aligned caption data for externally
 * hosted videos, with single-item and bulk workflows.
 *
 * ## Features
 *
 * - Caption track selection with manual-over-auto-generated preference
 * - Bounded, time-expiring transcript cache (LRU + TTL)
 * - Sliding-window rate limiting with an independent concurrency cap
 * - Transient-error retry with linear backoff per network step
 * - Bulk fan-out with partial-failure isolation and progress reporting
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `transcript`: Transcript, segment and caption track data model
 * - `track_selector`: Pure caption track selection policy
 * - `cache`: Bounded LRU + TTL transcript cache
 * - `rate_limiter`: Windowed admission gate
 * - `extractor`: Extraction orchestration and retry policy
 * - `bulk`: Bounded-concurrency bulk processing and reporting
 * - `sources`: Page source and segment fetcher contracts, plus the
 *   HTTP implementation in `sources::youtube`
 * - `errors`: Classified error taxonomy
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod bulk;
pub mod cache;
pub mod errors;
pub mod extractor;
pub mod rate_limiter;
pub mod sources;
pub mod track_selector;
pub mod transcript;

// Re-export main types for easier usage
pub use app_config::Config;
pub use bulk::{
    generate_report, BulkItemResult, BulkOptions, BulkOutcome, BulkProcessor, BulkReport,
};
pub use cache::{CacheStats, TranscriptCache};
pub use errors::ExtractError;
pub use extractor::{ExtractOptions, TranscriptExtractor};
pub use rate_limiter::{RateLimitStatus, RateLimiter};
pub use track_selector::select_track;
pub use transcript::{CaptionTrack, TrackKind, Transcript, TranscriptSegment};
