//! Module to enumerate audio files in the library directory

use log::warn;
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

use crate::storage::error::StorageError;

const AUDIO_EXTENSION: &str = "mp3";

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION))
        .unwrap_or(false)
}

/// A bare file name, with no directory components that could escape the library.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AudioFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Lists audio files directly inside `dir`, sorted by file name.
///
/// Failing to read the directory itself is an error; unreadable entries are skipped.
pub fn list_audio_files(dir: &Path) -> Result<Vec<AudioFile>, StorageError> {
    let dir_str = dir.to_string_lossy();
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(StorageError::Directory {
                    path: dir.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                warn!("error while scanning dir {dir_str}, skipping an entry: {err}");
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_audio_file(entry.path()) {
            continue;
        }

        match entry.file_name().to_str() {
            Some(name) => files.push(AudioFile {
                filename: name.to_string(),
                path: entry.path().to_path_buf(),
            }),
            None => warn!(
                "skipping audio file with non UTF-8 name: {}",
                entry.path().to_string_lossy()
            ),
        }
    }

    Ok(files)
}
