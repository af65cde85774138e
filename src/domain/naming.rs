//! Fills in track title and artist from the `Artist - Title.mp3` filename convention
//! whenever tag data is missing or partial.

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

const SEPARATOR: &str = " - ";
const AUDIO_EXTENSION: &str = ".mp3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub title: String,
    pub artist: String,
}

/// Removes the file extension.
///
/// The audio extension is matched case-insensitively; anything else is cut at the last dot.
pub fn strip_extension(filename: &str) -> &str {
    let len = filename.len();
    if len > AUDIO_EXTENSION.len()
        && filename.is_char_boundary(len - AUDIO_EXTENSION.len())
        && filename[len - AUDIO_EXTENSION.len()..].eq_ignore_ascii_case(AUDIO_EXTENSION)
    {
        return &filename[..len - AUDIO_EXTENSION.len()];
    }
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

/// Resolves display names. Tag values always win over filename-derived ones.
pub fn resolve(title: Option<&str>, artist: Option<&str>, filename: &str) -> ResolvedNames {
    let mut title = title.filter(|t| !t.is_empty()).map(str::to_string);
    let mut artist = artist.filter(|a| !a.is_empty()).map(str::to_string);
    let stem = strip_extension(filename);

    if title.is_none() || artist.is_none() {
        match stem.split_once(SEPARATOR) {
            Some((candidate_artist, candidate_title)) => {
                artist.get_or_insert_with(|| candidate_artist.trim().to_string());
                title.get_or_insert_with(|| candidate_title.trim().to_string());
            }
            None => {
                title.get_or_insert_with(|| stem.to_string());
            }
        }
    }

    ResolvedNames {
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| stem.to_string()),
        artist: artist
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
    }
}

/// Names for a file whose tags could not be read at all.
pub fn from_filename(filename: &str) -> ResolvedNames {
    resolve(None, None, filename)
}
