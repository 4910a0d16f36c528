/*!
 * External collaborator contracts for the extraction pipeline.
 *
 * The pipeline only ever talks to the outside world through these two
 * traits: a page source that turns a video id into metadata plus the list
 * of available caption tracks, and a segment fetcher that turns a selected
 * track locator into timed text segments. The `youtube` module provides a
 * concrete HTTP implementation of both.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ExtractError;
use crate::transcript::{TranscriptSegment, VideoPage};

/// Source of video metadata and caption track listings
#[async_trait]
pub trait PageSource: Send + Sync + Debug {
    /// Fetch metadata and available caption tracks for a video.
    ///
    /// Unplayable videos fail with the matching terminal classification
    /// (`NotFound`, `Private`, `Deleted`, `AgeRestricted`); transport
    /// problems fail with a retryable `Timeout` or `NetworkError`.
    async fn fetch_page(&self, video_id: &str) -> Result<VideoPage, ExtractError>;
}

/// Retrieval of timed text segments for a selected caption track
#[async_trait]
pub trait SegmentFetcher: Send + Sync + Debug {
    /// Fetch the ordered timed segments behind a track locator.
    ///
    /// A response malformed in a way that may be a transient render issue
    /// is classified retryable (`NetworkError`).
    async fn fetch_segments(&self, locator: &str) -> Result<Vec<TranscriptSegment>, ExtractError>;
}

pub mod youtube;
