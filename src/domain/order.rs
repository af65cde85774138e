//! Merges a preferred playback order with the unordered track set.

use std::collections::HashSet;

use crate::domain::track::Track;

/// Filename part of a source locator: the segment after the final `/`.
pub fn source_filename(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

/// Orders tracks so that those named in `preferred` come first, in that order.
///
/// Preferred names with no matching track are skipped. All other tracks follow in
/// the order they were received. Each filename is emitted at most once.
pub fn apply_preferred_order(tracks: Vec<Track>, preferred: &[String]) -> Vec<Track> {
    let mut seen = HashSet::new();
    let mut remaining: Vec<Option<Track>> = Vec::with_capacity(tracks.len());
    for track in tracks {
        let key = source_filename(&track.src);
        // unjoinable or duplicate
        if key.is_empty() || !seen.insert(key.to_string()) {
            continue;
        }
        remaining.push(Some(track));
    }

    let mut ordered = Vec::with_capacity(remaining.len());
    for name in preferred {
        let slot = remaining.iter_mut().find(
            |slot| matches!(slot, Some(track) if source_filename(&track.src) == name.as_str()),
        );
        if let Some(slot) = slot {
            ordered.extend(slot.take());
        }
    }

    ordered.extend(remaining.into_iter().flatten());
    ordered
}
