/*!
 * Core data model for extracted transcripts.
 *
 * Transcripts are assembled once per successful extraction and are
 * immutable afterwards; a cache refresh replaces the value, it never
 * mutates one in place.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timed text segment of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text for this segment
    pub text: String,

    /// Offset of the segment from the start of the video, in seconds
    pub start_seconds: f64,

    /// How long the segment stays on screen, in seconds
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }

    /// End offset of the segment, in seconds
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Origin of a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackKind {
    /// Authored by a human
    Manual,
    /// Produced by automated speech recognition
    AutoGenerated,
}

/// One available caption track on a video.
///
/// Ephemeral: exists only during track selection and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Opaque handle the segment fetcher uses to retrieve timed text
    pub locator: String,

    /// Language code of the track (e.g. "en", "en-US")
    pub language_code: String,

    /// Human-readable track name, best-effort
    pub display_name: String,

    /// Whether the track is manual or auto-generated
    pub kind: TrackKind,
}

/// Best-effort video metadata reported by the page source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title, may be empty
    pub title: String,

    /// Channel name, may be empty
    pub channel: String,

    /// Video length in seconds, zero when unreported
    pub duration_seconds: f64,
}

/// Everything a page source learns about a video in one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPage {
    /// Best-effort metadata
    pub metadata: VideoMetadata,

    /// Available caption tracks, in the order the source lists them
    pub tracks: Vec<CaptionTrack>,
}

/// Result of one successful extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Opaque external video identifier
    pub video_id: String,

    /// Video title, best-effort
    pub title: String,

    /// Channel name, best-effort
    pub channel: String,

    /// Video length in seconds
    pub duration_seconds: f64,

    /// Language code of the selected track, may differ from the requested one
    pub language: String,

    /// Whether the selected track was auto-generated
    pub is_auto_generated: bool,

    /// Timed segments ordered by `start_seconds` ascending; the pipeline
    /// neither re-sorts nor merges them
    pub segments: Vec<TranscriptSegment>,

    /// When the extraction completed
    pub fetched_at: DateTime<Utc>,
}

impl Transcript {
    /// Number of timed segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// All segment text joined with single spaces
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
