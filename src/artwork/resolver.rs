//! Artwork resolution chain: Embedded -> External -> Online.
//!
//! Each source is independently failable and yields `Option`, letting the
//! next source try. The chain returns `None` only when all three sources
//! found nothing or were skipped. The online source runs only when the
//! caller explicitly asks for it AND downloading missing covers is
//! enabled in configuration.

use std::path::Path;

use tracing::debug;

use crate::metadata::FileMetadata;

use super::embedded::embedded_artwork;
use super::external::find_external_artwork;
use super::online::{AlbumInfoProvider, fetch_online_artwork};

/// Multi-source artwork resolver.
pub struct ArtworkResolver<'a> {
    provider: &'a dyn AlbumInfoProvider,
    download_missing_covers: bool,
}

impl<'a> ArtworkResolver<'a> {
    pub fn new(provider: &'a dyn AlbumInfoProvider, download_missing_covers: bool) -> Self {
        Self {
            provider,
            download_missing_covers,
        }
    }

    /// Resolve one artwork image for the album the given track belongs to.
    pub async fn resolve(
        &self,
        metadata: &FileMetadata,
        audio_path: &Path,
        get_online_artwork: bool,
    ) -> Option<Vec<u8>> {
        if let Some(bytes) = embedded_artwork(metadata) {
            debug!(path = %audio_path.display(), "artwork resolved from embedded tag");
            return Some(bytes);
        }

        if let Some(bytes) = find_external_artwork(audio_path) {
            debug!(path = %audio_path.display(), "artwork resolved from external file");
            return Some(bytes);
        }

        if get_online_artwork && self.download_missing_covers {
            if let Some(bytes) = fetch_online_artwork(self.provider, metadata).await {
                debug!(path = %audio_path.display(), "artwork resolved online");
                return Some(bytes);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    use crate::error::Result;

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        url: Option<String>,
    }

    #[async_trait]
    impl AlbumInfoProvider for CountingProvider {
        async fn largest_image_url(&self, _artist: &str, _album: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.url.clone())
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(b"online bytes".to_vec())
        }
    }

    fn metadata_with(picture: Option<Vec<u8>>) -> FileMetadata {
        FileMetadata {
            album: Some("Album".to_string()),
            album_artists: vec!["Artist".to_string()],
            picture,
            ..FileMetadata::default()
        }
    }

    #[tokio::test]
    async fn test_embedded_short_circuits() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(&audio, b"audio").unwrap();
        // An external cover exists but embedded must win.
        std::fs::write(temp.path().join("front.jpg"), b"external").unwrap();

        let provider = CountingProvider::default();
        let resolver = ArtworkResolver::new(&provider, true);

        let result = resolver
            .resolve(&metadata_with(Some(b"embedded".to_vec())), &audio, true)
            .await;

        assert_eq!(result, Some(b"embedded".to_vec()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_external_beats_online() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(&audio, b"audio").unwrap();
        std::fs::write(temp.path().join("cover.png"), b"external").unwrap();

        let provider = CountingProvider::default();
        let resolver = ArtworkResolver::new(&provider, true);

        let result = resolver.resolve(&metadata_with(None), &audio, true).await;

        assert_eq!(result, Some(b"external".to_vec()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_online_skipped_when_not_requested() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let provider = CountingProvider {
            url: Some("http://img/x.jpg".to_string()),
            ..CountingProvider::default()
        };
        // Setting enabled, but the caller did not request online lookup.
        let resolver = ArtworkResolver::new(&provider, true);

        let result = resolver.resolve(&metadata_with(None), &audio, false).await;
        assert_eq!(result, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_online_skipped_when_disabled_in_config() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let provider = CountingProvider {
            url: Some("http://img/x.jpg".to_string()),
            ..CountingProvider::default()
        };
        let resolver = ArtworkResolver::new(&provider, false);

        let result = resolver.resolve(&metadata_with(None), &audio, true).await;
        assert_eq!(result, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_online_used_as_last_resort() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let provider = CountingProvider {
            url: Some("http://img/x.jpg".to_string()),
            ..CountingProvider::default()
        };
        let resolver = ArtworkResolver::new(&provider, true);

        let result = resolver.resolve(&metadata_with(None), &audio, true).await;
        assert_eq!(result, Some(b"online bytes".to_vec()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
