//! Where track metadata comes from at request time.
//!
//! [`LiveSource`] parses tags straight from the audio directory, [`ManifestSource`]
//! answers from the precomputed manifest and extracted artwork files. Both expose
//! the same [`TrackSource`] interface and are picked by configuration.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    config::{LibraryConfig, ManifestConfig, SourceKind},
    domain::{naming, order::source_filename, track::Track},
    metadata::{DEFAULT_PICTURE_TYPE, cache::TagCache, error::MetadataError},
    storage::{
        error::StorageError,
        fs::{AudioFile, is_audio_file, is_plain_filename, list_audio_files},
    },
};

/// Path of the artwork endpoint that live track listings point at.
pub const ARTWORK_ENDPOINT: &str = "/api/audio/artwork";

/// Cover art for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    Embedded { content_type: String, data: Vec<u8> },
    /// The track exists but carries no picture
    Missing,
}

pub trait TrackSource: Send + Sync {
    /// All available tracks, one per audio file, in no particular order.
    fn list_tracks(&self) -> Result<Vec<Track>, StorageError>;

    /// Cover art of the track stored under `filename`.
    fn artwork(&self, filename: &str) -> Result<Artwork, StorageError>;
}

/// Opens the configured track source.
pub fn open(
    kind: SourceKind,
    library: &LibraryConfig,
    manifest: &ManifestConfig,
) -> Result<Box<dyn TrackSource>, StorageError> {
    match kind {
        SourceKind::Live => Ok(Box::new(LiveSource::new(library.clone()))),
        SourceKind::Manifest => Ok(Box::new(ManifestSource::load(manifest)?)),
    }
}

pub struct LiveSource {
    library: LibraryConfig,
    cache: TagCache,
}

impl LiveSource {
    pub fn new(library: LibraryConfig) -> Self {
        Self {
            library,
            cache: TagCache::new(),
        }
    }

    fn resolve_track(&self, file: &AudioFile) -> Track {
        let names = match self.cache.get_or_parse(&file.path) {
            Ok(meta) => naming::resolve(
                meta.title.as_deref(),
                meta.artist.as_deref(),
                &file.filename,
            ),
            Err(err) => {
                warn!("Error processing {}: {err}", file.filename);
                naming::from_filename(&file.filename)
            }
        };

        let artwork = format!(
            "{ARTWORK_ENDPOINT}?file={}",
            urlencoding::encode(&file.filename)
        );
        Track::new(
            names.title,
            names.artist,
            &self.library.audio_url_prefix,
            &file.filename,
            Some(artwork),
        )
    }
}

impl TrackSource for LiveSource {
    fn list_tracks(&self) -> Result<Vec<Track>, StorageError> {
        let files = list_audio_files(&self.library.audio_dir)?;
        self.cache
            .retain(&files.iter().map(|file| file.path.as_path()).collect::<HashSet<_>>());

        Ok(files
            .par_iter()
            .map(|file| self.resolve_track(file))
            .collect())
    }

    fn artwork(&self, filename: &str) -> Result<Artwork, StorageError> {
        if !is_plain_filename(filename) {
            return Err(StorageError::TrackNotFound(filename.to_string()));
        }
        let path = self.library.audio_dir.join(filename);
        if !path.is_file() || !is_audio_file(&path) {
            return Err(StorageError::TrackNotFound(filename.to_string()));
        }

        match self.cache.get_or_parse(&path) {
            Ok(meta) => Ok(match meta.first_picture() {
                Some(picture) => Artwork::Embedded {
                    content_type: picture.content_type().to_string(),
                    data: picture.data.clone(),
                },
                None => Artwork::Missing,
            }),
            Err(MetadataError::Io(err)) => Err(StorageError::Fs(err)),
            Err(err) => {
                debug!("No readable tag in {filename}: {err}");
                Ok(Artwork::Missing)
            }
        }
    }
}

pub struct ManifestSource {
    tracks: Vec<Track>,
    artwork_dir: PathBuf,
}

impl ManifestSource {
    pub fn load(config: &ManifestConfig) -> Result<Self, StorageError> {
        let contents =
            std::fs::read_to_string(&config.path).map_err(|source| StorageError::ManifestRead {
                path: config.path.clone(),
                source,
            })?;
        let tracks: Vec<Track> =
            serde_json::from_str(&contents).map_err(|source| StorageError::ManifestFormat {
                path: config.path.clone(),
                source,
            })?;

        info!(
            "Loaded manifest with {} tracks from {}",
            tracks.len(),
            config.path.to_string_lossy()
        );
        Ok(Self::from_tracks(tracks, config.artwork_dir.clone()))
    }

    pub fn from_tracks(tracks: Vec<Track>, artwork_dir: PathBuf) -> Self {
        Self {
            tracks,
            artwork_dir,
        }
    }
}

impl TrackSource for ManifestSource {
    fn list_tracks(&self) -> Result<Vec<Track>, StorageError> {
        Ok(self.tracks.clone())
    }

    fn artwork(&self, filename: &str) -> Result<Artwork, StorageError> {
        let track = self
            .tracks
            .iter()
            .find(|t| t.filename == filename)
            .ok_or_else(|| StorageError::TrackNotFound(filename.to_string()))?;

        let Some(locator) = track.artwork.as_deref() else {
            return Ok(Artwork::Missing);
        };
        let name = source_filename(locator);
        if !is_plain_filename(name) {
            return Ok(Artwork::Missing);
        }

        read_artwork_file(&self.artwork_dir.join(name))
    }
}

fn read_artwork_file(path: &Path) -> Result<Artwork, StorageError> {
    match std::fs::read(path) {
        Ok(data) => Ok(Artwork::Embedded {
            content_type: mime_guess::from_path(path)
                .first_raw()
                .unwrap_or(DEFAULT_PICTURE_TYPE)
                .to_string(),
            data,
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Artwork listed in manifest is missing: {}",
                path.to_string_lossy()
            );
            Ok(Artwork::Missing)
        }
        Err(err) => Err(StorageError::Fs(err)),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{domain::naming::UNKNOWN_ARTIST, metadata::tagged_mp3, storage::manifest};

    fn library(dir: &Path) -> LibraryConfig {
        LibraryConfig {
            audio_dir: dir.to_path_buf(),
            audio_url_prefix: "/audio".to_string(),
        }
    }

    fn manifest_config(dir: &Path) -> ManifestConfig {
        ManifestConfig {
            path: dir.join("manifest.json"),
            artwork_dir: dir.join("artwork"),
            artwork_url_prefix: "/audio/artwork".to_string(),
        }
    }

    #[test]
    fn live_lists_one_entry_per_file_even_when_parsing_fails() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        for name in ["a - one.mp3", "b - two.mp3", "three.mp3"] {
            std::fs::write(tmp.path().join(name), b"garbage")?;
        }

        let source = LiveSource::new(library(tmp.path()));
        let tracks = source.list_tracks()?;

        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[2].title, "three");
        assert_eq!(tracks[2].artist, UNKNOWN_ARTIST);

        Ok(())
    }

    #[test]
    fn live_artwork_locator_points_at_endpoint() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("home alone. - fling.mp3"),
            tagged_mp3(Some("fling"), Some("home alone."), None),
        )?;

        let tracks = LiveSource::new(library(tmp.path())).list_tracks()?;

        assert_eq!(
            tracks[0].artwork.as_deref(),
            Some("/api/audio/artwork?file=home%20alone.%20-%20fling.mp3")
        );
        assert_eq!(tracks[0].src, "/audio/home alone. - fling.mp3");

        Ok(())
    }

    #[test]
    fn live_listing_forgets_removed_files() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        for name in ["a - one.mp3", "b - two.mp3"] {
            std::fs::write(tmp.path().join(name), tagged_mp3(Some("t"), None, None))?;
        }
        let source = LiveSource::new(library(tmp.path()));
        source.list_tracks()?;
        assert_eq!(source.cache.len(), 2);

        std::fs::rename(tmp.path().join("b - two.mp3"), tmp.path().join("c - two.mp3"))?;
        std::fs::remove_file(tmp.path().join("a - one.mp3"))?;
        let tracks = source.list_tracks()?;

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].filename, "c - two.mp3");
        assert_eq!(source.cache.len(), 1);

        Ok(())
    }

    #[test]
    fn live_missing_directory_fails_listing() {
        let tmp = TempDir::new().unwrap();
        let source = LiveSource::new(library(&tmp.path().join("gone")));

        assert!(matches!(
            source.list_tracks(),
            Err(StorageError::Directory { .. })
        ));
    }

    #[test]
    fn live_artwork_returns_embedded_picture() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("x.mp3"),
            tagged_mp3(None, None, Some(("image/png", b"PNG".as_slice()))),
        )?;

        let artwork = LiveSource::new(library(tmp.path())).artwork("x.mp3")?;

        assert_eq!(
            artwork,
            Artwork::Embedded {
                content_type: "image/png".to_string(),
                data: b"PNG".to_vec(),
            }
        );

        Ok(())
    }

    #[test]
    fn live_artwork_mislabeled_picture_is_jpeg() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("x.mp3"),
            tagged_mp3(Some("t"), None, Some(("jpg", b"JPEG".as_slice()))),
        )?;

        let artwork = LiveSource::new(library(tmp.path())).artwork("x.mp3")?;

        assert!(matches!(
            artwork,
            Artwork::Embedded { ref content_type, .. } if content_type == "image/jpeg"
        ));

        Ok(())
    }

    #[test]
    fn live_artwork_without_tag_is_missing() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        std::fs::write(tmp.path().join("x.mp3"), b"untagged")?;

        let artwork = LiveSource::new(library(tmp.path())).artwork("x.mp3")?;

        assert_eq!(artwork, Artwork::Missing);

        Ok(())
    }

    #[test]
    fn live_artwork_unknown_or_escaping_file_is_not_found() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        std::fs::write(tmp.path().join("notes.txt"), b"x")?;
        let source = LiveSource::new(library(tmp.path()));

        for name in ["nope.mp3", "../x.mp3", "notes.txt"] {
            assert!(
                matches!(source.artwork(name), Err(StorageError::TrackNotFound(_))),
                "{name} should not be found"
            );
        }

        Ok(())
    }

    #[test]
    fn manifest_source_serves_built_manifest() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("a - one.mp3"),
            tagged_mp3(None, None, Some(("image/png", b"PNG".as_slice()))),
        )?;
        std::fs::write(tmp.path().join("b - two.mp3"), b"raw")?;
        let config = manifest_config(tmp.path());
        let report = manifest::build(&library(tmp.path()), &config)?;

        let source = ManifestSource::load(&config)?;

        assert_eq!(source.list_tracks()?, report.tracks);
        assert_eq!(
            source.artwork("a - one.mp3")?,
            Artwork::Embedded {
                content_type: "image/png".to_string(),
                data: b"PNG".to_vec(),
            }
        );
        assert_eq!(source.artwork("b - two.mp3")?, Artwork::Missing);
        assert!(matches!(
            source.artwork("c.mp3"),
            Err(StorageError::TrackNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn manifest_source_requires_manifest() {
        let tmp = TempDir::new().unwrap();

        let err = ManifestSource::load(&manifest_config(tmp.path())).err().unwrap();

        assert!(matches!(err, StorageError::ManifestRead { .. }), "got {err:?}");
    }

    #[test]
    fn manifest_source_rejects_invalid_json() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let config = manifest_config(tmp.path());
        std::fs::write(&config.path, "{not json")?;

        let err = ManifestSource::load(&config).err().unwrap();

        assert!(matches!(err, StorageError::ManifestFormat { .. }), "got {err:?}");

        Ok(())
    }
}
