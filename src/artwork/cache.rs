//! Artwork disk cache.
//!
//! Resolved artwork is transcoded (resized to fit a fixed square, re-
//! encoded as JPEG) and written to the cache directory under a freshly
//! assigned content id of the form `album-<uuid>`. That id is the unit of
//! artwork identity referenced by `album_artwork.artwork_id`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result, ResultExt};

/// Maximum cached image dimension (width and height) in pixels.
pub const MAX_DIMENSION: u32 = 360;

/// JPEG quality for cached images.
pub const JPEG_QUALITY: u8 = 80;

/// Globally unique content id for one cached artwork file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkId(String);

impl ArtworkId {
    /// Assign a fresh id.
    pub fn random() -> Self {
        Self(format!("album-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resizes and re-encodes raw image bytes.
pub trait ImageTranscoder: Send + Sync {
    /// Resize to fit within `max_width` x `max_height` (preserving aspect
    /// ratio) and encode as JPEG at `quality`.
    fn resize_to_jpeg(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        quality: u8,
    ) -> Result<Vec<u8>>;
}

/// Production transcoder backed by the image crate.
pub struct JpegTranscoder;

impl ImageTranscoder for JpegTranscoder {
    fn resize_to_jpeg(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        quality: u8,
    ) -> Result<Vec<u8>> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| Error::artwork(e.to_string()))?;
        let resized = decoded.resize(max_width, max_height, FilterType::Lanczos3);

        let mut out = Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        resized
            .write_with_encoder(encoder)
            .map_err(|e| Error::artwork(e.to_string()))?;
        Ok(out.into_inner())
    }
}

/// On-disk artwork cache: one `<id>.jpg` per cached artwork id.
pub struct ArtworkCache {
    cache_dir: PathBuf,
    transcoder: Box<dyn ImageTranscoder>,
}

impl ArtworkCache {
    /// Create a cache in the specified directory.
    pub fn new(cache_dir: impl Into<PathBuf>, transcoder: Box<dyn ImageTranscoder>) -> Self {
        let cache_dir = cache_dir.into();
        let _ = std::fs::create_dir_all(&cache_dir);
        Self {
            cache_dir,
            transcoder,
        }
    }

    /// Create a cache in the default location (user cache directory).
    pub fn default_location() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("chorale")
            .join("CoverArt");
        Self::new(cache_dir, Box::new(JpegTranscoder))
    }

    /// Transcode and store raw image bytes under a fresh id.
    ///
    /// Returns `None` when the input is empty or any transcode/write step
    /// fails; failures are logged, not propagated, so artwork resolution
    /// for the album is simply retried on a later pass.
    pub fn store(&self, bytes: &[u8]) -> Option<ArtworkId> {
        if bytes.is_empty() {
            return None;
        }

        match self.try_store(bytes) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "failed to cache artwork");
                None
            }
        }
    }

    fn try_store(&self, bytes: &[u8]) -> Result<ArtworkId> {
        let id = ArtworkId::random();
        let jpeg =
            self.transcoder
                .resize_to_jpeg(bytes, MAX_DIMENSION, MAX_DIMENSION, JPEG_QUALITY)?;
        std::fs::write(self.path_for(id.as_str()), jpeg)
            .with_context(format!("writing cached artwork {id}"))?;
        Ok(id)
    }

    /// Path of the cached file for an artwork id.
    pub fn path_for(&self, artwork_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{artwork_id}.jpg"))
    }

    /// Whether an artwork id has a cached file.
    pub fn contains(&self, artwork_id: &str) -> bool {
        self.path_for(artwork_id).exists()
    }

    /// Delete the cached file for an artwork id.
    pub fn remove(&self, artwork_id: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.path_for(artwork_id))
    }

    /// Every artwork id currently present on disk, derived from the cache
    /// directory's file names. Used for disk reconciliation.
    pub fn cached_ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };

        entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
                    return None;
                }
                path.file_stem()?.to_str().map(|s| s.to_string())
            })
            .collect()
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Passthrough transcoder for tests: no decode, no resize.
#[cfg(test)]
pub struct PassthroughTranscoder;

#[cfg(test)]
impl ImageTranscoder for PassthroughTranscoder {
    fn resize_to_jpeg(
        &self,
        bytes: &[u8],
        _max_width: u32,
        _max_height: u32,
        _quality: u8,
    ) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
