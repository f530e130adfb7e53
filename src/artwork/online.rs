//! Online artwork: album-info lookup against a Last.fm-style endpoint.
//!
//! The pipeline depends only on the [`AlbumInfoProvider`] trait so tests
//! can substitute a fake. [`LastFmClient`] is the production client: it
//! queries `album.getinfo` and picks the largest available image URL.
//! Invalid or error JSON yields "no result", not an error; only transport
//! failures surface as errors, and the caller tries the next candidate
//! artist.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::metadata::FileMetadata;

/// Looks up album images and downloads them.
#[async_trait]
pub trait AlbumInfoProvider: Send + Sync {
    /// URL of the largest available image for the album, if the provider
    /// knows the album at all.
    async fn largest_image_url(&self, artist: &str, album: &str) -> Result<Option<String>>;

    /// Download raw image bytes.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Image size ranking, largest first.
const SIZE_RANK: &[&str] = &["mega", "extralarge", "large", "medium", "small"];

/// Last.fm album.getinfo response (only the fields we read).
#[derive(Debug, Deserialize)]
pub struct AlbumInfoResponse {
    pub album: Option<AlbumDto>,
}

/// One album record with its ranked image set.
#[derive(Debug, Deserialize)]
pub struct AlbumDto {
    #[serde(default)]
    pub image: Vec<ImageDto>,
}

/// One image entry: a URL and a size label (small..mega).
#[derive(Debug, Deserialize)]
pub struct ImageDto {
    #[serde(rename = "#text", default)]
    pub url: String,
    #[serde(default)]
    pub size: String,
}

impl AlbumDto {
    /// The largest image with a non-empty URL.
    pub fn largest_image_url(&self) -> Option<String> {
        for size in SIZE_RANK {
            if let Some(image) = self
                .image
                .iter()
                .find(|i| i.size == *size && !i.url.is_empty())
            {
                return Some(image.url.clone());
            }
        }
        // No recognized size label: take any non-empty URL.
        self.image
            .iter()
            .rev()
            .find(|i| !i.url.is_empty())
            .map(|i| i.url.clone())
    }
}

/// Production provider against the Last.fm web API.
pub struct LastFmClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

const DEFAULT_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";

impl LastFmClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

}

#[async_trait]
impl AlbumInfoProvider for LastFmClient {
    async fn largest_image_url(&self, artist: &str, album: &str) -> Result<Option<String>> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("method", "album.getinfo"),
                ("artist", artist),
                ("album", album),
                ("autocorrect", "1"),
                ("api_key", &self.api_key),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| Error::provider(e.to_string()))?;

        if !response.status().is_success() {
            // Unknown album, bad key, rate limit: all "no result".
            return Ok(None);
        }

        let body: AlbumInfoResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => return Ok(None),
        };

        Ok(body.album.and_then(|a| a.largest_image_url()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::provider(format!(
                "HTTP {} downloading {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::provider(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Fetch artwork online for a track's metadata.
///
/// The search title is the album title, else the track title. Candidate
/// artists are the album artists first, then the track artists, blanks
/// filtered. The first candidate producing a downloadable image wins;
/// every per-artist failure is logged and the next candidate is tried.
pub async fn fetch_online_artwork(
    provider: &dyn AlbumInfoProvider,
    metadata: &FileMetadata,
) -> Option<Vec<u8>> {
    let title = metadata
        .album
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(metadata.title.as_deref())
        .filter(|t| !t.trim().is_empty())?
        .trim()
        .to_string();

    let candidates: Vec<&str> = metadata
        .album_artists
        .iter()
        .chain(metadata.artists.iter())
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    for artist in candidates {
        let url = match provider.largest_image_url(artist, &title).await {
            Ok(Some(url)) => url,
            Ok(None) => continue,
            Err(e) => {
                warn!(artist, album = %title, error = %e, "album info lookup failed");
                continue;
            }
        };

        match provider.download(&url).await {
            Ok(bytes) if !bytes.is_empty() => return Some(bytes),
            Ok(_) => continue,
            Err(e) => {
                warn!(artist, url, error = %e, "artwork download failed");
                continue;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_album_info_response() {
        let json = r##"{
            "album": {
                "name": "Back in Black",
                "artist": "AC/DC",
                "image": [
                    {"#text": "http://img/small.jpg", "size": "small"},
                    {"#text": "http://img/large.jpg", "size": "large"},
                    {"#text": "", "size": "mega"}
                ]
            }
        }"##;

        let response: AlbumInfoResponse =
            serde_json::from_str(json).expect("Should parse album info response");
        let album = response.album.unwrap();
        // mega has an empty URL, so large wins.
        assert_eq!(
            album.largest_image_url(),
            Some("http://img/large.jpg".to_string())
        );
    }

    #[test]
    fn test_parse_missing_album_is_none() {
        let response: AlbumInfoResponse =
            serde_json::from_str(r#"{"error": 6, "message": "Album not found"}"#).unwrap();
        assert!(response.album.is_none());
    }

    #[test]
    fn test_largest_image_url_no_images() {
        let album = AlbumDto { image: Vec::new() };
        assert_eq!(album.largest_image_url(), None);
    }

    struct FakeProvider {
        image_for_artist: String,
        bytes: Vec<u8>,
        lookups: std::sync::Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl AlbumInfoProvider for FakeProvider {
        async fn largest_image_url(&self, artist: &str, album: &str) -> Result<Option<String>> {
            self.lookups
                .lock()
                .unwrap()
                .push((artist.to_string(), album.to_string()));
            if artist == self.image_for_artist {
                Ok(Some("http://img/x.jpg".to_string()))
            } else {
                Ok(None)
            }
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.bytes.clone())
        }
    }

    #[tokio::test]
    async fn test_fetch_tries_candidates_in_order() {
        let provider = FakeProvider {
            image_for_artist: "Track Artist".to_string(),
            bytes: b"image".to_vec(),
            lookups: std::sync::Mutex::new(Vec::new()),
        };
        let metadata = FileMetadata {
            album: Some("Album".to_string()),
            album_artists: vec!["Album Artist".to_string()],
            artists: vec!["Track Artist".to_string()],
            ..FileMetadata::default()
        };

        let result = fetch_online_artwork(&provider, &metadata).await;
        assert_eq!(result, Some(b"image".to_vec()));

        let lookups = provider.lookups.lock().unwrap();
        assert_eq!(lookups.len(), 2);
        assert_eq!(lookups[0].0, "Album Artist");
        assert_eq!(lookups[1].0, "Track Artist");
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_track_title() {
        let provider = FakeProvider {
            image_for_artist: "A".to_string(),
            bytes: b"image".to_vec(),
            lookups: std::sync::Mutex::new(Vec::new()),
        };
        let metadata = FileMetadata {
            title: Some("Single".to_string()),
            artists: vec!["A".to_string()],
            ..FileMetadata::default()
        };

        assert!(fetch_online_artwork(&provider, &metadata).await.is_some());
        assert_eq!(provider.lookups.lock().unwrap()[0].1, "Single");
    }

    #[tokio::test]
    async fn test_fetch_without_title_is_none() {
        let provider = FakeProvider {
            image_for_artist: "A".to_string(),
            bytes: Vec::new(),
            lookups: std::sync::Mutex::new(Vec::new()),
        };

        let metadata = FileMetadata {
            artists: vec!["A".to_string()],
            ..FileMetadata::default()
        };
        assert!(fetch_online_artwork(&provider, &metadata).await.is_none());
        assert!(provider.lookups.lock().unwrap().is_empty());
    }
}
