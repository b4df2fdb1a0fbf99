//! Default tag writer backed by the `lofty` crate.
//!
//! Replaces a file's tag values with those of a chosen candidate and embeds
//! the candidate's artwork as the front cover, downloading it through the
//! injected HTTP bridge.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::collaborators::TagWriter;
use crate::error::{ReconcileError, Result};
use crate::models::CandidateTrack;

/// Default timeout for artwork downloads.
const DEFAULT_ARTWORK_TIMEOUT: Duration = Duration::from_secs(10);

/// Tag writer using `lofty`, with artwork download via the HTTP bridge.
pub struct TagFileWriter {
    http_client: Arc<dyn HttpClient>,
    artwork_timeout: Duration,
}

impl TagFileWriter {
    /// Create a writer with the default artwork timeout (10s).
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            artwork_timeout: DEFAULT_ARTWORK_TIMEOUT,
        }
    }

    /// Create a writer with a custom artwork timeout.
    pub fn with_timeout(http_client: Arc<dyn HttpClient>, artwork_timeout: Duration) -> Self {
        Self {
            http_client,
            artwork_timeout,
        }
    }

    /// Download the candidate's artwork.
    async fn fetch_artwork(&self, url: &str) -> Result<(Bytes, MimeType)> {
        debug!(url = %url, "Downloading candidate artwork");

        let request = HttpRequest::get(url).timeout(self.artwork_timeout);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| ReconcileError::Update(format!("Artwork download failed: {}", e)))?;

        if !response.is_success() {
            return Err(ReconcileError::Update(format!(
                "Artwork download failed: HTTP {}",
                response.status
            )));
        }

        if response.body.is_empty() {
            return Err(ReconcileError::Update(
                "Artwork download returned an empty body".to_string(),
            ));
        }

        let mime = response
            .headers
            .get("content-type")
            .or_else(|| response.headers.get("Content-Type"))
            .map(|ct| Self::mime_from_content_type(ct))
            .unwrap_or(MimeType::Jpeg);

        Ok((response.body, mime))
    }

    /// Map a Content-Type header to a lofty picture MIME type.
    ///
    /// Catalog artwork is overwhelmingly JPEG; anything unrecognized falls
    /// back to it.
    fn mime_from_content_type(content_type: &str) -> MimeType {
        match content_type.split(';').next().unwrap_or("").trim() {
            "image/png" => MimeType::Png,
            "image/gif" => MimeType::Gif,
            "image/bmp" => MimeType::Bmp,
            "image/tiff" => MimeType::Tiff,
            _ => MimeType::Jpeg,
        }
    }

    /// Write the candidate's text fields into the file's primary tag.
    fn write_text_fields(path: &Path, candidate: &CandidateTrack) -> Result<()> {
        let mut tagged_file = lofty::read_from_path(path)
            .map_err(|e| ReconcileError::Update(format!("Failed to read tags: {}", e)))?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| {
            ReconcileError::Update(format!("No writable tag available for {:?}", tag_type))
        })?;

        tag.set_title(candidate.title.clone());
        tag.set_artist(candidate.artist.clone());
        tag.set_album(candidate.album.clone());
        if let Some(year) = candidate.year.and_then(|y| u32::try_from(y).ok()) {
            tag.set_year(year);
        }
        if let Some(genre) = &candidate.genre {
            tag.set_genre(genre.clone());
        }
        if let Some(track) = candidate.track_number {
            tag.set_track(track);
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| ReconcileError::Update(format!("Failed to write tags: {}", e)))?;

        Ok(())
    }

    /// Replace every embedded picture with the downloaded front cover.
    fn embed_artwork(path: &Path, data: Vec<u8>, mime: MimeType) -> Result<()> {
        let mut tagged_file = lofty::read_from_path(path)
            .map_err(|e| ReconcileError::Update(format!("Failed to read tags: {}", e)))?;

        let tag_type = tagged_file.primary_tag_type();
        let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| {
            ReconcileError::Update(format!("No writable tag available for {:?}", tag_type))
        })?;

        // Files can carry multiple pictures; clear them all before adding
        // the new front cover.
        while !tag.pictures().is_empty() {
            tag.remove_picture(0);
        }

        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(mime),
            Some("Cover".to_string()),
            data,
        ));

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| ReconcileError::Update(format!("Failed to write artwork: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl TagWriter for TagFileWriter {
    /// Apply the candidate's metadata to the file at `path`.
    ///
    /// Text fields are saved first; the artwork is downloaded and embedded
    /// with a second save. The update is therefore not atomic: when the
    /// artwork step fails after the first save succeeded, the file keeps the
    /// new text fields alongside its old artwork. The error returned in that
    /// case still marks the whole update as failed.
    async fn apply_update(&self, path: &Path, candidate: &CandidateTrack) -> Result<()> {
        let text_path = path.to_path_buf();
        let text_candidate = candidate.clone();
        tokio::task::spawn_blocking(move || Self::write_text_fields(&text_path, &text_candidate))
            .await
            .map_err(|e| ReconcileError::Update(format!("Tag write task failed: {}", e)))??;

        if let Some(url) = candidate.artwork_url.as_deref() {
            let (data, mime) = self.fetch_artwork(url).await.inspect_err(|e| {
                warn!(
                    file = %path.display(),
                    error = %e,
                    "Artwork step failed after text fields were saved"
                );
            })?;

            let art_path = path.to_path_buf();
            tokio::task::spawn_blocking(move || Self::embed_artwork(&art_path, data.to_vec(), mime))
                .await
                .map_err(|e| ReconcileError::Update(format!("Artwork task failed: {}", e)))??;
        }

        info!(
            file = %path.display(),
            catalog_id = %candidate.catalog_id,
            "Metadata updated"
        );

        Ok(())
    }
}
