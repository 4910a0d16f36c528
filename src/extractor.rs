/*!
 * Transcript extraction orchestration.
 *
 * The extractor wires the page source, track selector and segment fetcher
 * together behind the cache and the rate limiter, and owns the retry
 * policy for the two network steps. Cache and rate limiter are
 * constructor-injected fields rather than ambient globals, so independent
 * pipeline instances can be configured side by side.
 */

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::sleep;

use crate::app_config::{Config, ExtractionConfig};
use crate::cache::{CacheStats, TranscriptCache};
use crate::errors::ExtractError;
use crate::rate_limiter::{RateLimitStatus, RateLimiter};
use crate::sources::{PageSource, SegmentFetcher};
use crate::track_selector::select_track;
use crate::transcript::{TrackKind, Transcript};

/// Video identifiers are always 11 URL-safe base64 characters
static VIDEO_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern"));

/// Per-call extraction options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    /// Preferred caption language; `None` leaves the choice to the
    /// selection policy (manual tracks first)
    pub language: Option<String>,
}

impl ExtractOptions {
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
        }
    }
}

/// Orchestrates a single extraction end to end
pub struct TranscriptExtractor {
    page_source: Arc<dyn PageSource>,
    segment_fetcher: Arc<dyn SegmentFetcher>,
    cache: TranscriptCache,
    rate_limiter: Arc<RateLimiter>,
    config: ExtractionConfig,
}

impl TranscriptExtractor {
    /// Create a new extractor with its own cache and rate limiter built
    /// from the configuration
    pub fn new(
        page_source: Arc<dyn PageSource>,
        segment_fetcher: Arc<dyn SegmentFetcher>,
        config: &Config,
    ) -> Self {
        Self {
            page_source,
            segment_fetcher,
            cache: TranscriptCache::new(&config.cache),
            rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            config: config.extraction.clone(),
        }
    }

    /// Extract the transcript for one video.
    ///
    /// A warm cache entry is returned without touching the network or the
    /// rate limiter; on a miss the fetch is admitted by the limiter,
    /// retried per the transient-error policy, and the result is cached
    /// only on success.
    pub async fn extract(
        &self,
        video_id: &str,
        options: &ExtractOptions,
    ) -> Result<Transcript, ExtractError> {
        let video_id = video_id.trim();
        if !VIDEO_ID_PATTERN.is_match(video_id) {
            return Err(ExtractError::InvalidIdentifier(video_id.to_string()));
        }

        let requested = options
            .language
            .as_deref()
            .or(self.config.default_language.as_deref());

        if let Some(transcript) = self.cache.get(video_id, requested) {
            debug!("Returning cached transcript for {}", video_id);
            return Ok(transcript);
        }

        let transcript = self
            .rate_limiter
            .admit(self.fetch_uncached(video_id, requested))
            .await?;

        self.cache.set(video_id, requested, transcript.clone());
        info!(
            "Extracted transcript for {} ({} segments, language {})",
            video_id,
            transcript.segment_count(),
            transcript.language
        );
        Ok(transcript)
    }

    async fn fetch_uncached(
        &self,
        video_id: &str,
        requested: Option<&str>,
    ) -> Result<Transcript, ExtractError> {
        let page = self
            .with_retry("page fetch", || self.page_source.fetch_page(video_id))
            .await?;

        let track = select_track(&page.tracks, requested)
            .ok_or_else(|| {
                ExtractError::NoTranscriptAvailable(match requested {
                    Some(language) => format!("{} (requested language {})", video_id, language),
                    None => video_id.to_string(),
                })
            })?
            .clone();
        debug!(
            "Selected {:?} track {} for {}",
            track.kind, track.language_code, video_id
        );

        let segments = self
            .with_retry("segment fetch", || {
                self.segment_fetcher.fetch_segments(&track.locator)
            })
            .await?;

        let duration_seconds = if page.metadata.duration_seconds > 0.0 {
            page.metadata.duration_seconds
        } else {
            segments
                .last()
                .map(|segment| segment.end_seconds())
                .unwrap_or(0.0)
        };

        Ok(Transcript {
            video_id: video_id.to_string(),
            title: page.metadata.title,
            channel: page.metadata.channel,
            duration_seconds,
            language: track.language_code.clone(),
            is_auto_generated: track.kind == TrackKind::AutoGenerated,
            segments,
            fetched_at: Utc::now(),
        })
    }

    /// Run a network step with the transient-error retry policy: up to
    /// `retry_attempts` total attempts, linearly increasing delay
    /// (`attempt * base_delay`), terminal errors propagate immediately
    async fn with_retry<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, ExtractError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExtractError>>,
    {
        let attempts = self.config.retry_attempts.max(1);

        for attempt in 1..=attempts {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < attempts => {
                    let delay = self.config.retry_base_delay() * attempt;
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label, attempt, attempts, error, delay
                    );
                    sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }

        // The loop always returns from its last iteration
        unreachable!("retry loop exhausted without returning")
    }

    /// Cache statistics for observability
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached transcript
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Rate limiter status for observability
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.status()
    }
}
