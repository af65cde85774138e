//! Reads title, artist and embedded pictures from ID3v2-tagged MP3 files.

use std::{
    fs::File,
    io::{BufReader, Cursor},
    path::Path,
};

use id3::{Tag, TagLike};

use crate::metadata::error::MetadataError;

pub mod cache;
pub mod error;

/// Content type used when a picture's declared format is not an image type.
pub const DEFAULT_PICTURE_TYPE: &str = "image/jpeg";

/// An embedded picture as declared in the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// MIME-like format string, as written by the tagger
    pub format: String,
    pub data: Vec<u8>,
}

impl Picture {
    /// Content type to serve the picture with. Mislabeled formats are served as JPEG.
    pub fn content_type(&self) -> &str {
        if self.format.starts_with("image/") {
            &self.format
        } else {
            DEFAULT_PICTURE_TYPE
        }
    }

    /// File extension for the picture when persisted on disk.
    pub fn extension(&self) -> &'static str {
        let format = self.format.to_lowercase();
        if format.contains("jpeg") || format.contains("jpg") {
            "jpg"
        } else if format.contains("png") {
            "png"
        } else if format.contains("gif") {
            "gif"
        } else if format.contains("webp") {
            "webp"
        } else {
            "jpg"
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub pictures: Vec<Picture>,
}

impl RawMetadata {
    fn from_tag(tag: &Tag) -> Self {
        let text = |value: Option<&str>| {
            value
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            title: text(tag.title()),
            artist: text(tag.artist()),
            pictures: tag
                .pictures()
                .map(|pic| Picture {
                    format: pic.mime_type.clone(),
                    data: pic.data.clone(),
                })
                .collect(),
        }
    }

    /// Only the first embedded picture is ever used.
    pub fn first_picture(&self) -> Option<&Picture> {
        self.pictures.first()
    }
}

/// Parses the ID3v2 tag at the start of an in-memory MP3 buffer.
pub fn extract(bytes: &[u8]) -> Result<RawMetadata, MetadataError> {
    let tag = Tag::read_from2(Cursor::new(bytes))?;
    Ok(RawMetadata::from_tag(&tag))
}

/// Parses the ID3v2 tag of an MP3 file without loading the audio data.
pub fn extract_from_path(path: &Path) -> Result<RawMetadata, MetadataError> {
    let file = File::open(path)?;
    let tag = Tag::read_from2(BufReader::new(file))?;
    Ok(RawMetadata::from_tag(&tag))
}

/// Builds an MP3-like buffer: an ID3v2.4 tag followed by a few bytes of fake audio.
#[cfg(test)]
pub fn tagged_mp3(
    title: Option<&str>,
    artist: Option<&str>,
    picture: Option<(&str, &[u8])>,
) -> Vec<u8> {
    use id3::{Version, frame::PictureType};

    let mut tag = Tag::new();
    if let Some(title) = title {
        tag.set_title(title);
    }
    if let Some(artist) = artist {
        tag.set_artist(artist);
    }
    if let Some((mime_type, data)) = picture {
        tag.add_frame(id3::frame::Picture {
            mime_type: mime_type.to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: data.to_vec(),
        });
    }

    let mut buf = Vec::new();
    tag.write_to(&mut buf, Version::Id3v24).unwrap();
    buf.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00]);
    buf
}
