/*!
 * HTTP implementation of the page source and segment fetcher contracts,
 * built on the public watch page and its timed-text endpoint.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::app_config::Config;
use crate::errors::ExtractError;
use crate::sources::{PageSource, SegmentFetcher};
use crate::transcript::{CaptionTrack, TrackKind, TranscriptSegment, VideoMetadata, VideoPage};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

static XML_TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text start="([0-9.]+)"(?: dur="([0-9.]+)")?[^>]*>(.*?)</text>"#)
        .expect("timed-text pattern")
});

/// Client for the watch page and its timed-text endpoint.
///
/// Implements both `PageSource` and `SegmentFetcher`, so one instance can
/// back a whole extractor.
#[derive(Debug)]
pub struct YouTubeSource {
    /// Base URL of the video host
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

impl YouTubeSource {
    /// Create a new source with the given per-call timeout
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create a new source with the configured per-call timeout
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extraction.request_timeout())
    }

    /// Create a new source against a custom base URL.
    ///
    /// Uses connection pooling for better performance with concurrent
    /// requests.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, ExtractError> {
        let url = format!("{}/watch?v={}&hl=en", self.base_url, video_id);

        let response = self
            .client
            .get(&url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ExtractError::NotFound(video_id.to_string()));
        }
        if !status.is_success() {
            error!("Watch page request for {} failed with {}", video_id, status);
            return Err(ExtractError::NetworkError(format!(
                "watch page request failed ({})",
                status
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageSource for YouTubeSource {
    async fn fetch_page(&self, video_id: &str) -> Result<VideoPage, ExtractError> {
        let html = self.fetch_watch_page(video_id).await?;

        // A page without an embedded player response is usually a transient
        // render issue, so it is classified retryable
        let player = extract_player_response(&html).ok_or_else(|| {
            ExtractError::NetworkError(format!(
                "player response missing from watch page for {}",
                video_id
            ))
        })?;

        classify_playability(video_id, &player)?;

        let metadata = parse_metadata(&player);
        let tracks = parse_tracks(&player);
        debug!(
            "Fetched page for {}: {} caption track(s)",
            video_id,
            tracks.len()
        );

        Ok(VideoPage { metadata, tracks })
    }
}

#[async_trait]
impl SegmentFetcher for YouTubeSource {
    async fn fetch_segments(&self, locator: &str) -> Result<Vec<TranscriptSegment>, ExtractError> {
        let mut url = Url::parse(locator).map_err(|e| {
            ExtractError::NetworkError(format!("invalid track locator: {}", e))
        })?;
        if !url.query_pairs().any(|(key, _)| key == "fmt") {
            url.query_pairs_mut().append_pair("fmt", "json3");
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!("Timed-text request failed with {}", status);
            return Err(ExtractError::NetworkError(format!(
                "timed text request failed ({})",
                status
            )));
        }

        let body = response.text().await?;
        parse_json3_segments(&body)
            .or_else(|| parse_xml_segments(&body))
            .ok_or_else(|| ExtractError::NetworkError("malformed timed-text response".to_string()))
    }
}

/// Locate and parse the embedded `ytInitialPlayerResponse` object
fn extract_player_response(html: &str) -> Option<Value> {
    let marker = html.find("ytInitialPlayerResponse")?;
    let brace = html[marker..].find('{')? + marker;
    let json = balanced_json_object(&html[brace..])?;
    serde_json::from_str(json).ok()
}

/// Slice the balanced `{...}` object starting at the first byte,
/// string-literal aware
fn balanced_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Map the player response playability status onto the error taxonomy
fn classify_playability(video_id: &str, player: &Value) -> Result<(), ExtractError> {
    let status = player
        .pointer("/playabilityStatus/status")
        .and_then(Value::as_str)
        .unwrap_or("OK");
    if status.eq_ignore_ascii_case("ok") {
        return Ok(());
    }

    let reason = player
        .pointer("/playabilityStatus/reason")
        .and_then(Value::as_str)
        .unwrap_or("");
    let lowered = reason.to_ascii_lowercase();
    let message = if reason.is_empty() {
        video_id.to_string()
    } else {
        format!("{}: {}", video_id, reason)
    };

    match status {
        "LOGIN_REQUIRED" => {
            if lowered.contains("age") {
                Err(ExtractError::AgeRestricted(message))
            } else {
                Err(ExtractError::Private(message))
            }
        }
        "AGE_CHECK_REQUIRED" | "CONTENT_CHECK_REQUIRED" => {
            Err(ExtractError::AgeRestricted(message))
        }
        "ERROR" => {
            if lowered.contains("removed")
                || lowered.contains("deleted")
                || lowered.contains("terminated")
            {
                Err(ExtractError::Deleted(message))
            } else {
                Err(ExtractError::NotFound(message))
            }
        }
        _ => Err(ExtractError::Unknown(message)),
    }
}

fn parse_metadata(player: &Value) -> VideoMetadata {
    let details = player.get("videoDetails");
    let text_field = |field: &str| {
        details
            .and_then(|d| d.get(field))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    VideoMetadata {
        title: text_field("title"),
        channel: text_field("author"),
        duration_seconds: details
            .and_then(|d| d.get("lengthSeconds"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0),
    }
}

fn parse_tracks(player: &Value) -> Vec<CaptionTrack> {
    player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .map(|tracks| tracks.iter().filter_map(parse_track).collect())
        .unwrap_or_default()
}

fn parse_track(value: &Value) -> Option<CaptionTrack> {
    let locator = value.get("baseUrl")?.as_str()?.to_string();
    let language_code = value.get("languageCode")?.as_str()?.to_string();
    let display_name = value
        .pointer("/name/simpleText")
        .or_else(|| value.pointer("/name/runs/0/text"))
        .and_then(Value::as_str)
        .unwrap_or(language_code.as_str())
        .to_string();
    let kind = if value.get("kind").and_then(Value::as_str) == Some("asr") {
        TrackKind::AutoGenerated
    } else {
        TrackKind::Manual
    };

    Some(CaptionTrack {
        locator,
        language_code,
        display_name,
        kind,
    })
}

/// Parse the `json3` timed-text body. Events without text segments
/// (window styling, positioning) are skipped.
fn parse_json3_segments(body: &str) -> Option<Vec<TranscriptSegment>> {
    let value: Value = serde_json::from_str(body).ok()?;
    let events = value.get("events")?.as_array()?;

    let mut segments = Vec::new();
    for event in events {
        let Some(segs) = event.get("segs").and_then(Value::as_array) else {
            continue;
        };
        let text = segs
            .iter()
            .filter_map(|seg| seg.get("utf8").and_then(Value::as_str))
            .collect::<String>()
            .replace('\n', " ")
            .trim()
            .to_string();
        if text.is_empty() {
            continue;
        }

        let start_ms = event.get("tStartMs").and_then(Value::as_f64).unwrap_or(0.0);
        let duration_ms = event
            .get("dDurationMs")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        segments.push(TranscriptSegment::new(
            text,
            start_ms / 1000.0,
            duration_ms / 1000.0,
        ));
    }
    Some(segments)
}

/// Legacy XML `<text start dur>` fallback for tracks that ignore `fmt=json3`
fn parse_xml_segments(body: &str) -> Option<Vec<TranscriptSegment>> {
    if !body.contains("<text") {
        return None;
    }

    let mut segments = Vec::new();
    for captures in XML_TEXT_PATTERN.captures_iter(body) {
        let start = captures[1].parse::<f64>().unwrap_or(0.0);
        let duration = captures
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);
        let text = unescape_xml(&captures[3]).trim().to_string();
        if text.is_empty() {
            continue;
        }
        segments.push(TranscriptSegment::new(text, start, duration));
    }
    Some(segments)
}

fn unescape_xml(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
