use serde::{Deserialize, Serialize};

/// Represent a playable audio track, as listed to clients and persisted in the manifest.
///
/// Field order is the JSON key order, which keeps regenerated manifests byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    /// locator of the raw audio stream
    pub src: String,
    /// locator of the cover art, if any
    pub artwork: Option<String>,
    /// audio filename, the join key between manifest entries and ordering preferences
    pub filename: String,
}

impl Track {
    pub fn new(
        title: String,
        artist: String,
        audio_url_prefix: &str,
        filename: &str,
        artwork: Option<String>,
    ) -> Self {
        Self {
            title,
            artist,
            src: format!("{}/{}", audio_url_prefix.trim_end_matches('/'), filename),
            artwork,
            filename: filename.to_string(),
        }
    }
}
