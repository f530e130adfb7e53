//! Audio file metadata extraction.
//!
//! Uses the lofty crate for format-independent tag access. The indexing
//! pipeline depends only on the [`MetadataExtractor`] trait so tests can
//! substitute a fake; [`LoftyExtractor`] is the production implementation.

use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};

use crate::error::{Error, Result};

/// Flat metadata record read from one audio file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetadata {
    pub title: Option<String>,
    pub album: Option<String>,
    pub album_artists: Vec<String>,
    pub artists: Vec<String>,
    pub genres: Vec<String>,
    pub year: Option<u32>,
    pub track_number: Option<u32>,
    pub track_count: Option<u32>,
    pub disc_number: Option<u32>,
    pub disc_count: Option<u32>,
    pub duration_ms: Option<u64>,
    pub bit_rate: Option<u32>,
    pub sample_rate: Option<u32>,
    pub lyrics: Option<String>,
    /// Front cover bytes embedded in the tag, if any
    pub picture: Option<Vec<u8>>,
    pub rating: Option<u32>,
}

/// Reads the metadata record for one audio file. Failures surface as
/// errors the caller catches per file.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<FileMetadata>;
}

/// Production extractor backed by lofty.
pub struct LoftyExtractor;

impl MetadataExtractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> Result<FileMetadata> {
        let tagged_file = Probe::open(path)
            .map_err(|e| Error::extraction(path, e.to_string()))?
            .read()
            .map_err(|e| Error::extraction(path, e.to_string()))?;

        // Primary tag, or the first available one.
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let properties = tagged_file.properties();
        let duration_ms = Some(properties.duration().as_millis() as u64);
        let bit_rate = properties.audio_bitrate();
        let sample_rate = properties.sample_rate();

        let mut metadata = FileMetadata {
            duration_ms,
            bit_rate,
            sample_rate,
            ..FileMetadata::default()
        };

        if let Some(tag) = tag {
            metadata.title = tag.title().map(|s| s.to_string());
            metadata.album = tag.album().map(|s| s.to_string());
            metadata.artists = tag
                .artist()
                .map(|s| split_values(&s))
                .unwrap_or_default();
            metadata.album_artists = tag
                .get_string(&ItemKey::AlbumArtist)
                .map(split_values)
                .unwrap_or_default();
            metadata.genres = tag
                .genre()
                .map(|s| split_values(&s))
                .unwrap_or_default();
            metadata.year = tag.year();
            metadata.track_number = tag.track();
            metadata.track_count = tag.track_total();
            metadata.disc_number = tag.disk();
            metadata.disc_count = tag.disk_total();
            metadata.lyrics = tag.get_string(&ItemKey::Lyrics).map(|s| s.to_string());
            metadata.rating = tag
                .get_string(&ItemKey::Popularimeter)
                .and_then(|s| s.parse().ok());
            metadata.picture = front_cover(tag);
        }

        Ok(metadata)
    }
}

/// Prefer the front cover, fall back to the first picture.
fn front_cover(tag: &Tag) -> Option<Vec<u8>> {
    let pictures = tag.pictures();
    pictures
        .iter()
        .find(|p| p.pic_type() == lofty::picture::PictureType::CoverFront)
        .or_else(|| pictures.first())
        .map(|p| p.data().to_vec())
}

/// Split a possibly multi-valued tag string on `;`, trimming each value.
fn split_values(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fake extractor for tests: canned records per path, everything else
/// errors like an unreadable file would.
#[cfg(test)]
pub struct FakeExtractor {
    records: std::sync::Mutex<std::collections::HashMap<std::path::PathBuf, FileMetadata>>,
}

#[cfg(test)]
impl FakeExtractor {
    pub fn new() -> Self {
        Self {
            records: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn insert(&self, path: impl Into<std::path::PathBuf>, metadata: FileMetadata) {
        self.records.lock().unwrap().insert(path.into(), metadata);
    }
}

#[cfg(test)]
impl MetadataExtractor for FakeExtractor {
    fn extract(&self, path: &Path) -> Result<FileMetadata> {
        self.records
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::extraction(path, "unreadable tag"))
    }
}
