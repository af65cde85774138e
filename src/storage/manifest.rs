//! Build-time manifest generation.
//!
//! Resolves every audio file once, writes embedded cover art next to the audio files
//! and persists the whole track list as a single JSON array. The manifest is
//! regenerated wholesale; running the builder twice over an unchanged directory
//! produces identical output.

use std::path::PathBuf;

use anyhow::Context;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    config::{LibraryConfig, ManifestConfig},
    domain::{naming, track::Track},
    metadata::{self, Picture, error::MetadataError},
    storage::{
        error::StorageError,
        fs::{AudioFile, list_audio_files},
    },
};

#[derive(Debug)]
pub struct ManifestReport {
    pub tracks: Vec<Track>,
    pub artwork_written: usize,
    pub path: PathBuf,
}

/// Generates the manifest and artwork files.
///
/// Not safe to run concurrently against the same output paths.
pub fn build(
    library: &LibraryConfig,
    manifest: &ManifestConfig,
) -> Result<ManifestReport, StorageError> {
    let files = list_audio_files(&library.audio_dir)?;
    info!("Processing {} audio files...", files.len());

    std::fs::create_dir_all(&manifest.artwork_dir)?;

    let tracks: Vec<Track> = files
        .par_iter()
        .map(|file| build_entry(file, library, manifest))
        .collect();

    let json = serde_json::to_string_pretty(&tracks)
        .with_context(|| "Failed to serialize audio manifest")?;
    if let Some(parent) = manifest.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&manifest.path, json)?;

    let artwork_written = tracks.iter().filter(|t| t.artwork.is_some()).count();
    info!(
        "Generated audio manifest with {} tracks ({} with artwork) at {}",
        tracks.len(),
        artwork_written,
        manifest.path.to_string_lossy()
    );

    Ok(ManifestReport {
        tracks,
        artwork_written,
        path: manifest.path.clone(),
    })
}

fn build_entry(file: &AudioFile, library: &LibraryConfig, manifest: &ManifestConfig) -> Track {
    let meta = match std::fs::read(&file.path)
        .map_err(MetadataError::from)
        .and_then(|bytes| metadata::extract(&bytes))
    {
        Ok(meta) => meta,
        Err(err) => {
            warn!("Could not parse metadata for {}: {err}", file.filename);
            let names = naming::from_filename(&file.filename);
            return Track::new(
                names.title,
                names.artist,
                &library.audio_url_prefix,
                &file.filename,
                None,
            );
        }
    };

    let names = naming::resolve(
        meta.title.as_deref(),
        meta.artist.as_deref(),
        &file.filename,
    );

    let artwork = meta
        .first_picture()
        .and_then(|picture| match persist_artwork(picture, &file.filename, manifest) {
            Ok(url) => {
                debug!("Extracted artwork for: {}", file.filename);
                Some(url)
            }
            Err(err) => {
                warn!("Could not write artwork for {}: {err}", file.filename);
                None
            }
        });

    Track::new(
        names.title,
        names.artist,
        &library.audio_url_prefix,
        &file.filename,
        artwork,
    )
}

/// Name of the artwork file extracted for an audio file.
pub fn artwork_filename(audio_filename: &str, picture: &Picture) -> String {
    format!(
        "{}.{}",
        naming::strip_extension(audio_filename),
        picture.extension()
    )
}

/// Writes the picture to the artwork directory, returns its public locator.
fn persist_artwork(
    picture: &Picture,
    audio_filename: &str,
    manifest: &ManifestConfig,
) -> std::io::Result<String> {
    let name = artwork_filename(audio_filename, picture);
    std::fs::write(manifest.artwork_dir.join(&name), &picture.data)?;
    Ok(format!(
        "{}/{}",
        manifest.artwork_url_prefix.trim_end_matches('/'),
        name
    ))
}
