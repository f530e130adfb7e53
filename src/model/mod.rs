//! Persisted entities of the collection index.
//!
//! The models map to the following tables:
//! - `folder` - configured scan roots
//! - `track` - one row per audio file on disk (unique by path)
//! - `folder_track` - which folder a track was discovered under
//! - `removed_track` - tombstones for deleted tracks
//! - `album_artwork` - one cached artwork per album key
//!
//! [`IndexablePath`] is the only non-persisted type here: it is produced
//! per scan and consumed by the same indexing pass.

use std::path::PathBuf;

use sqlx::FromRow;

/// A configured music folder (scan root).
#[derive(Debug, Clone, FromRow)]
pub struct Folder {
    /// Database ID (auto-generated)
    pub folder_id: i64,
    /// Absolute directory path (unique)
    pub path: String,
    /// Whether the folder's tracks appear in the collection (1 = shown)
    pub show_in_collection: i64,
}

/// A track (audio file) in the collection.
///
/// Multi-valued fields (`artists`, `genres`, `album_artists`) hold
/// delimiter-encoded strings; use [`crate::keys::decode_values`] to read
/// them back as lists.
#[derive(Debug, Clone, FromRow)]
pub struct Track {
    /// Database ID (auto-generated)
    pub track_id: i64,
    /// Absolute file path (unique identifier)
    pub path: String,
    /// Lowercased path for case-insensitive lookups
    pub safe_path: String,
    /// File name including extension
    pub file_name: String,
    /// File size in bytes at last index
    pub file_size: i64,
    /// When the track was first added (ticks)
    pub date_added: i64,
    /// File modification time at last index (ticks)
    pub date_file_modified: i64,
    /// Deterministic album grouping key (see [`crate::keys`])
    pub album_key: String,
    /// Track title
    pub track_title: String,
    /// Delimiter-encoded artist list
    pub artists: String,
    /// Delimiter-encoded genre list
    pub genres: String,
    /// Album title
    pub album_title: String,
    /// Delimiter-encoded album artist list
    pub album_artists: String,
    /// Track number on the disc (0 = unknown)
    pub track_number: i64,
    /// Total tracks on the disc (0 = unknown)
    pub track_count: i64,
    /// Disc number (0 = unknown)
    pub disc_number: i64,
    /// Total discs (0 = unknown)
    pub disc_count: i64,
    /// Release year (0 = unknown)
    pub year: i64,
    /// Duration in milliseconds
    pub duration_ms: i64,
    /// Audio bit rate in kbps (0 = unknown)
    pub bit_rate: i64,
    /// Sample rate in Hz (0 = unknown)
    pub sample_rate: i64,
    /// Embedded lyrics, if any
    pub lyrics: String,
    /// Rating 0-5 (0 = unrated)
    pub rating: i64,
    /// 1 (or NULL) = must be (re)scanned, 0 = up to date
    pub needs_indexing: Option<i64>,
    /// 1 = artwork must be resolved for this track's album
    pub needs_album_artwork_indexing: i64,
    /// Outcome of the last extraction (1 = ok, 0 = failed, NULL = never ran)
    pub indexing_success: Option<i64>,
    /// Failure reason of the last extraction, if it failed
    pub indexing_failure_reason: Option<String>,
}

impl Track {
    /// Create a fresh, unfilled track for a path. All metadata fields
    /// start at their "unknown" defaults and `needs_indexing` is unset,
    /// which counts as needing indexing.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let safe_path = path.to_lowercase();
        let file_name = PathBuf::from(&path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        Self {
            track_id: 0,
            path,
            safe_path,
            file_name,
            file_size: 0,
            date_added: 0,
            date_file_modified: 0,
            album_key: String::new(),
            track_title: String::new(),
            artists: String::new(),
            genres: String::new(),
            album_title: String::new(),
            album_artists: String::new(),
            track_number: 0,
            track_count: 0,
            disc_number: 0,
            disc_count: 0,
            year: 0,
            duration_ms: 0,
            bit_rate: 0,
            sample_rate: 0,
            lyrics: String::new(),
            rating: 0,
            needs_indexing: None,
            needs_album_artwork_indexing: 0,
            indexing_success: None,
            indexing_failure_reason: None,
        }
    }
}

/// Junction row tying a track to the folder it was discovered under.
#[derive(Debug, Clone, FromRow)]
pub struct FolderTrack {
    /// Owning folder
    pub folder_id: i64,
    /// Discovered track
    pub track_id: i64,
}

/// Tombstone for a deleted track. Lets a later rescan skip re-adding the
/// file when `skip_removed_files_during_refresh` is enabled.
#[derive(Debug, Clone, FromRow)]
pub struct RemovedTrack {
    /// The deleted track's ID
    pub track_id: i64,
    /// The deleted track's path
    pub path: String,
    /// Lowercased path
    pub safe_path: String,
    /// When the removal happened (ticks)
    pub date_removed: i64,
}

impl RemovedTrack {
    /// Build a tombstone from the track being removed.
    pub fn from_track(track: &Track, date_removed: i64) -> Self {
        Self {
            track_id: track.track_id,
            path: track.path.clone(),
            safe_path: track.safe_path.clone(),
            date_removed,
        }
    }
}

/// A cached artwork image for one album key.
#[derive(Debug, Clone, FromRow)]
pub struct AlbumArtwork {
    /// Database ID (auto-generated)
    pub album_artwork_id: i64,
    /// Album this artwork belongs to (unique)
    pub album_key: String,
    /// Content id of the cached file, `album-<uuid>`
    pub artwork_id: String,
}

/// A file found during a folder walk that passed the audio extension
/// filter. Produced per scan, never persisted.
#[derive(Debug, Clone)]
pub struct IndexablePath {
    /// Absolute file path
    pub path: PathBuf,
    /// File modification time (ticks)
    pub date_modified_ticks: i64,
    /// The configured folder it was found under
    pub folder_id: i64,
}
