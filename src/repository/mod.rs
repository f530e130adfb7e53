//! Storage access for the collection index.
//!
//! The indexing pipeline depends only on the [`Repository`] trait, which
//! covers every table operation the reconciliation phases need. The
//! production implementation is [`SqliteRepository`]; tests use the
//! in-memory fake in [`memory`].

pub mod sqlite;

#[cfg(test)]
pub mod memory;

pub use sqlite::SqliteRepository;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AlbumArtwork, Folder, FolderTrack, RemovedTrack, Track};

/// Operations against the persisted collection state.
///
/// All methods are request/response: the single indexing worker is the
/// only writer, so no operation needs to guard against overlapping
/// mutation.
#[async_trait]
pub trait Repository: Send + Sync {
    // Folders

    /// Add a scan root. Returns the stored row.
    async fn add_folder(&self, path: &str) -> Result<Folder>;

    /// Look up a folder by its exact path.
    async fn folder_by_path(&self, path: &str) -> Result<Option<Folder>>;

    /// Remove a folder by id. Tracks under it are cleaned up by the next
    /// indexing pass, not here.
    async fn remove_folder(&self, folder_id: i64) -> Result<()>;

    /// All configured folders.
    async fn folders(&self) -> Result<Vec<Folder>>;

    // Tracks

    /// Insert a new track row. The caller looks the row up by path
    /// afterwards to learn its generated id.
    async fn add_track(&self, track: &Track) -> Result<()>;

    /// Persist every field of an existing track row.
    async fn update_track(&self, track: &Track) -> Result<()>;

    /// Delete one track row.
    async fn delete_track(&self, track_id: i64) -> Result<()>;

    /// Look up a track by its exact path.
    async fn track_by_path(&self, path: &str) -> Result<Option<Track>>;

    /// All track rows.
    async fn all_tracks(&self) -> Result<Vec<Track>>;

    /// Number of track rows.
    async fn track_count(&self) -> Result<i64>;

    /// Number of tracks still needing indexing (flag unset or non-zero).
    async fn needs_indexing_count(&self) -> Result<i64>;

    /// Largest persisted file-modified timestamp, or 0 with no tracks.
    async fn max_date_file_modified(&self) -> Result<i64>;

    /// Delete tracks whose folder_track points at a folder that no longer
    /// exists. Returns the number of deleted tracks.
    async fn delete_tracks_in_missing_folders(&self) -> Result<u64>;

    /// The most recently modified track of an album, used as the metadata
    /// source when resolving that album's artwork.
    async fn newest_track_for_album_key(&self, album_key: &str) -> Result<Option<Track>>;

    /// Clear `needs_album_artwork_indexing` for every track of an album.
    async fn clear_album_artwork_flag(&self, album_key: &str) -> Result<()>;

    // Folder tracks

    /// Record which folder a track was discovered under.
    async fn add_folder_track(&self, folder_id: i64, track_id: i64) -> Result<()>;

    /// All folder_track rows.
    async fn folder_tracks(&self) -> Result<Vec<FolderTrack>>;

    /// Delete folder_track rows whose track no longer exists. Returns the
    /// number of deleted rows.
    async fn delete_orphaned_folder_tracks(&self) -> Result<u64>;

    // Removed tracks

    /// Record a tombstone for a deleted track.
    async fn add_removed_track(&self, removed: &RemovedTrack) -> Result<()>;

    /// All tombstones.
    async fn removed_tracks(&self) -> Result<Vec<RemovedTrack>>;

    // Album artwork

    /// Insert an artwork row for an album.
    async fn add_album_artwork(&self, artwork: &AlbumArtwork) -> Result<()>;

    /// All artwork rows.
    async fn album_artworks(&self) -> Result<Vec<AlbumArtwork>>;

    /// Delete artwork rows whose album key matches no track. Returns the
    /// number of deleted rows.
    async fn delete_orphaned_album_artworks(&self) -> Result<u64>;

    /// Delete artwork rows for albums flagged for re-indexing. Returns
    /// the number of deleted rows.
    async fn delete_album_artworks_for_flagged_tracks(&self) -> Result<u64>;

    /// Distinct album keys that have no artwork row or are flagged for
    /// re-indexing.
    async fn album_keys_needing_artwork(&self) -> Result<Vec<String>>;
}
