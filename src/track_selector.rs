/*!
 * Caption track selection policy.
 *
 * Picks the best caption track for a request. Manual captions are higher
 * quality than auto-generated ones and win whenever the caller did not pin
 * a language that is only available as auto-generated.
 */

use crate::transcript::{CaptionTrack, TrackKind};

/// Normalize a language code for comparison
fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Select the best caption track for the requested language.
///
/// Priority order:
/// 1. `None` when no tracks are available.
/// 2. Exact match on the normalized requested language code.
/// 3. Prefix match (requested `en` matches available `en-US`).
/// 4. First manual track.
/// 5. First track in the provided order.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    requested_language: Option<&str>,
) -> Option<&'a CaptionTrack> {
    if tracks.is_empty() {
        return None;
    }

    if let Some(requested) = requested_language {
        let wanted = normalize(requested);
        if !wanted.is_empty() {
            if let Some(track) = tracks
                .iter()
                .find(|track| normalize(&track.language_code) == wanted)
            {
                return Some(track);
            }

            if let Some(track) = tracks
                .iter()
                .find(|track| normalize(&track.language_code).starts_with(&wanted))
            {
                return Some(track);
            }
        }
    }

    if let Some(track) = tracks.iter().find(|track| track.kind == TrackKind::Manual) {
        return Some(track);
    }

    tracks.first()
}
