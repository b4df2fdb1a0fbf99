//! Default tag reader backed by the `lofty` crate.
//!
//! Supports ID3v2, Vorbis Comments, MP4 tags, FLAC, and the other containers
//! lofty can probe. Extracts the text fields the reconciliation pipeline
//! compares, the duration from the audio properties, and the embedded
//! front-cover artwork.

use async_trait::async_trait;
use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;
use tracing::{debug, warn};

use crate::collaborators::TagReader;
use crate::error::{ReconcileError, Result};
use crate::models::{EmbeddedArtwork, LocalTrack};

/// Audio tag reader using `lofty`.
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    /// Create a reader with default parse options.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Create a reader with custom parse options.
    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    /// Clean up a tag text value.
    ///
    /// - Trims leading/trailing whitespace
    /// - Collapses consecutive whitespace to a single space
    /// - Removes control characters
    fn clean_text(text: &str) -> String {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .filter(|c| !c.is_control())
            .collect()
    }

    /// Wrap a non-empty cleaned value; empty tag values become `None`.
    fn text_field(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
        value
            .map(|s| Self::clean_text(s.as_ref()))
            .filter(|s| !s.is_empty())
    }

    /// Pick the front-cover artwork out of a tag.
    ///
    /// Prefers an explicit front-cover picture; files that carry only an
    /// untyped picture fall back to the first one present.
    fn extract_front_cover(tag: &lofty::tag::Tag) -> Option<EmbeddedArtwork> {
        let pictures = tag.pictures();
        let pic = pictures
            .iter()
            .find(|p| p.pic_type() == PictureType::CoverFront)
            .or_else(|| pictures.first())?;

        let data = Bytes::copy_from_slice(pic.data());
        if data.is_empty() {
            return None;
        }

        Some(EmbeddedArtwork {
            data,
            mime_type: pic
                .mime_type()
                .map(Self::mime_type_to_string)
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        })
    }

    /// Convert lofty MimeType to string
    fn mime_type_to_string(mime_type: &MimeType) -> String {
        match mime_type {
            MimeType::Png => "image/png".to_string(),
            MimeType::Jpeg => "image/jpeg".to_string(),
            MimeType::Tiff => "image/tiff".to_string(),
            MimeType::Bmp => "image/bmp".to_string(),
            MimeType::Gif => "image/gif".to_string(),
            _ => "application/octet-stream".to_string(),
        }
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagReader for LoftyTagReader {
    async fn read_local(&self, path: &Path) -> Result<LocalTrack> {
        debug!("Reading tags from: {}", path.display());

        let file_data = tokio::fs::read(path)
            .await
            .map_err(|e| ReconcileError::Read(format!("{}: {}", path.display(), e)))?;

        let tagged_file = Probe::new(std::io::Cursor::new(&file_data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| ReconcileError::Read(format!("Failed to probe file: {}", e)))?
            .read()
            .map_err(|e| ReconcileError::Read(format!("Failed to parse file: {}", e)))?;

        let duration_ms = tagged_file.properties().duration().as_millis() as u64;

        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let (title, artist, album, year, genre, track_number, artwork) = match tag {
            Some(tag) => (
                Self::text_field(tag.title()),
                Self::text_field(tag.artist()),
                Self::text_field(tag.album()),
                tag.year().map(|y| y as i32),
                Self::text_field(tag.genre()),
                tag.track(),
                Self::extract_front_cover(tag),
            ),
            None => {
                warn!(
                    "No tags found in file: {}. Using filename as title.",
                    path.display()
                );

                let filename = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(Self::clean_text)
                    .filter(|s| !s.is_empty());

                (filename, None, None, None, None, None, None)
            }
        };

        Ok(LocalTrack {
            file_path: path.to_path_buf(),
            title,
            artist,
            album,
            year,
            genre,
            track_number,
            duration_ms,
            artwork,
        })
    }
}
