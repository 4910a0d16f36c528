/*!
 * Bulk extraction processing.
 *
 * This module fans many independent extractions out under bounded
 * concurrency, isolates per-item failure, reports progress in completion
 * order and aggregates the outcome into a report. A failure in one item
 * never aborts or blocks the processing of the others.
 */

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use log::{debug, info};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::app_config::Config;
use crate::errors::ExtractError;
use crate::extractor::{ExtractOptions, TranscriptExtractor};
use crate::transcript::Transcript;

/// Callback invoked synchronously after every item resolves, in completion
/// order, with a snapshot of cumulative counts
pub type ProgressCallback = Arc<dyn Fn(&BulkProgress) + Send + Sync>;

/// One failed item in a bulk run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemError {
    pub video_id: String,
    pub error: String,
}

/// Outcome of one item in a bulk run; exactly one of `transcript` and
/// `error_message` is set
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    pub video_id: String,
    pub transcript: Option<Transcript>,
    pub error_kind: Option<&'static str>,
    pub error_message: Option<String>,
}

impl BulkItemResult {
    pub fn succeeded(video_id: String, transcript: Transcript) -> Self {
        Self {
            video_id,
            transcript: Some(transcript),
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failed(video_id: String, error: &ExtractError) -> Self {
        Self {
            video_id,
            transcript: None,
            error_kind: Some(error.kind()),
            error_message: Some(error.to_string()),
        }
    }

    pub fn success(&self) -> bool {
        self.transcript.is_some()
    }
}

/// Cumulative progress of a running bulk extraction
#[derive(Debug, Clone, PartialEq)]
pub struct BulkProgress {
    /// Items in the run after deduplication
    pub total: usize,
    /// Items resolved so far, successes and failures both
    pub completed: usize,
    /// Failed items so far
    pub failed: usize,
    /// Video id of the most recently resolved item
    pub current_video: String,
    /// Failures so far, in completion order
    pub errors: Vec<BulkItemError>,
}

impl BulkProgress {
    fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            failed: 0,
            current_video: String::new(),
            errors: Vec::new(),
        }
    }
}

/// Aggregated outcome of a bulk run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Successful items as a percentage of the total
    pub success_rate_percent: f64,
    /// Histogram of selected track languages, successful items only
    pub languages: BTreeMap<String, usize>,
    /// Summed transcript duration across successful items, in seconds
    pub total_duration_seconds: f64,
    /// Mean transcript duration across successful items, in seconds
    pub average_duration_seconds: f64,
    /// Failures in result order
    pub errors: Vec<BulkItemError>,
}

/// Options for one bulk run
#[derive(Clone, Default)]
pub struct BulkOptions {
    /// Preferred caption language for every item
    pub language: Option<String>,
    /// Worker pool size override; the configured default applies when unset
    pub concurrency: Option<usize>,
    /// Progress observer
    pub on_progress: Option<ProgressCallback>,
}

/// Combined outcome for transport layers: per-item results plus the
/// aggregated report
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub results: Vec<BulkItemResult>,
    pub report: BulkReport,
}

/// Bulk processor fanning extractions out over a shared extractor
pub struct BulkProcessor {
    extractor: Arc<TranscriptExtractor>,
    default_concurrency: usize,
}

impl BulkProcessor {
    /// Create a new bulk processor over the given extractor
    pub fn new(extractor: Arc<TranscriptExtractor>, config: &Config) -> Self {
        Self {
            extractor,
            default_concurrency: config.bulk.concurrency.max(1),
        }
    }

    /// Process many videos under bounded concurrency.
    ///
    /// Input ids are deduplicated preserving first occurrence; results come
    /// back in that order regardless of completion order. Item failures are
    /// captured in their result rows; the only error this method itself
    /// returns is for an empty input list.
    pub async fn process_bulk(
        &self,
        video_ids: &[String],
        options: &BulkOptions,
    ) -> Result<Vec<BulkItemResult>, ExtractError> {
        if video_ids.is_empty() {
            return Err(ExtractError::InvalidIdentifier(
                "bulk input list is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let unique: Vec<String> = video_ids
            .iter()
            .filter(|video_id| seen.insert(video_id.as_str()))
            .cloned()
            .collect();

        let total = unique.len();
        let concurrency = options
            .concurrency
            .unwrap_or(self.default_concurrency)
            .max(1);
        info!(
            "Starting bulk extraction of {} video(s) ({} duplicates dropped, concurrency {})",
            total,
            video_ids.len() - total,
            concurrency
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let progress = Arc::new(StdMutex::new(BulkProgress::new(total)));
        let started = Instant::now();

        let mut results = stream::iter(unique.into_iter().enumerate())
            .map(|(index, video_id)| {
                let extractor = self.extractor.clone();
                let semaphore = semaphore.clone();
                let progress = progress.clone();
                let on_progress = options.on_progress.clone();
                let extract_options = ExtractOptions {
                    language: options.language.clone(),
                };

                async move {
                    let _permit = semaphore.acquire().await.unwrap();

                    let item = match extractor.extract(&video_id, &extract_options).await {
                        Ok(transcript) => BulkItemResult::succeeded(video_id.clone(), transcript),
                        Err(error) => {
                            debug!("Bulk item {} failed: {}", video_id, error);
                            BulkItemResult::failed(video_id.clone(), &error)
                        }
                    };

                    let snapshot = {
                        let mut progress = progress.lock().unwrap();
                        progress.completed += 1;
                        progress.current_video = video_id;
                        if !item.success() {
                            progress.failed += 1;
                            progress.errors.push(BulkItemError {
                                video_id: item.video_id.clone(),
                                error: item
                                    .error_message
                                    .clone()
                                    .unwrap_or_else(|| "unknown error".to_string()),
                            });
                        }
                        on_progress.as_ref().map(|_| progress.clone())
                    };
                    // The observer runs outside the lock; a panicking
                    // callback cannot poison the shared progress state
                    if let (Some(callback), Some(snapshot)) = (&on_progress, &snapshot) {
                        callback(snapshot);
                    }

                    (index, item)
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        // Items complete in any order; the report keeps input order
        results.sort_by_key(|(index, _)| *index);
        let results: Vec<BulkItemResult> = results.into_iter().map(|(_, item)| item).collect();

        let failed = results.iter().filter(|item| !item.success()).count();
        info!(
            "Bulk extraction finished in {:?}: {}/{} succeeded",
            started.elapsed(),
            total - failed,
            total
        );
        Ok(results)
    }

    /// Process many videos and aggregate the outcome in one call
    pub async fn process_bulk_with_report(
        &self,
        video_ids: &[String],
        options: &BulkOptions,
    ) -> Result<BulkOutcome, ExtractError> {
        let results = self.process_bulk(video_ids, options).await?;
        let report = generate_report(&results);
        Ok(BulkOutcome { results, report })
    }
}

/// Aggregate bulk results into a report. Pure and synchronous, with no side
/// effects, safe to call on any result slice.
pub fn generate_report(results: &[BulkItemResult]) -> BulkReport {
    let total = results.len();
    let successful = results.iter().filter(|item| item.success()).count();
    let failed = total - successful;

    let mut languages: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_seconds = 0.0;
    for transcript in results.iter().filter_map(|item| item.transcript.as_ref()) {
        *languages.entry(transcript.language.clone()).or_insert(0) += 1;
        total_duration_seconds += transcript.duration_seconds;
    }

    let errors = results
        .iter()
        .filter(|item| !item.success())
        .map(|item| BulkItemError {
            video_id: item.video_id.clone(),
            error: item
                .error_message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        })
        .collect();

    BulkReport {
        total,
        successful,
        failed,
        success_rate_percent: if total > 0 {
            successful as f64 * 100.0 / total as f64
        } else {
            0.0
        },
        languages,
        total_duration_seconds,
        average_duration_seconds: if successful > 0 {
            total_duration_seconds / successful as f64
        } else {
            0.0
        },
        errors,
    }
}
