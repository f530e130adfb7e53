//! In-memory repository fake for tests.
//!
//! Mirrors the SQL semantics of [`super::SqliteRepository`] over plain
//! vectors so reconciliation logic can be tested without a database file.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AlbumArtwork, Folder, FolderTrack, RemovedTrack, Track};

use super::Repository;

#[derive(Default)]
struct State {
    folders: Vec<Folder>,
    tracks: Vec<Track>,
    folder_tracks: Vec<FolderTrack>,
    removed_tracks: Vec<RemovedTrack>,
    album_artworks: Vec<AlbumArtwork>,
    next_folder_id: i64,
    next_track_id: i64,
    next_artwork_id: i64,
}

/// In-memory [`Repository`] implementation.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    fail_track_updates: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`Repository::update_track`] call fail.
    pub fn fail_track_updates(&self) {
        self.fail_track_updates.store(true, Ordering::SeqCst);
    }
}

fn track_needs_indexing(track: &Track) -> bool {
    track.needs_indexing != Some(0)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn add_folder(&self, path: &str) -> Result<Folder> {
        let mut state = self.state.lock().unwrap();
        state.next_folder_id += 1;
        let folder = Folder {
            folder_id: state.next_folder_id,
            path: path.to_string(),
            show_in_collection: 1,
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn folder_by_path(&self, path: &str) -> Result<Option<Folder>> {
        let state = self.state.lock().unwrap();
        Ok(state.folders.iter().find(|f| f.path == path).cloned())
    }

    async fn remove_folder(&self, folder_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.folders.retain(|f| f.folder_id != folder_id);
        Ok(())
    }

    async fn folders(&self) -> Result<Vec<Folder>> {
        Ok(self.state.lock().unwrap().folders.clone())
    }

    async fn add_track(&self, track: &Track) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.tracks.iter().any(|t| t.path == track.path) {
            return Err(crate::error::Error::Database(sqlx::Error::Protocol(
                format!("UNIQUE constraint failed: track.path ({})", track.path),
            )));
        }
        state.next_track_id += 1;
        let mut stored = track.clone();
        stored.track_id = state.next_track_id;
        state.tracks.push(stored);
        Ok(())
    }

    async fn update_track(&self, track: &Track) -> Result<()> {
        if self.fail_track_updates.load(Ordering::SeqCst) {
            return Err(crate::error::Error::Database(sqlx::Error::Protocol(
                "update_track failure injected".to_string(),
            )));
        }
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .tracks
            .iter_mut()
            .find(|t| t.track_id == track.track_id)
        {
            *existing = track.clone();
        }
        Ok(())
    }

    async fn delete_track(&self, track_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tracks.retain(|t| t.track_id != track_id);
        Ok(())
    }

    async fn track_by_path(&self, path: &str) -> Result<Option<Track>> {
        let state = self.state.lock().unwrap();
        Ok(state.tracks.iter().find(|t| t.path == path).cloned())
    }

    async fn all_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.state.lock().unwrap().tracks.clone())
    }

    async fn track_count(&self) -> Result<i64> {
        Ok(self.state.lock().unwrap().tracks.len() as i64)
    }

    async fn needs_indexing_count(&self) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tracks
            .iter()
            .filter(|t| track_needs_indexing(t))
            .count() as i64)
    }

    async fn max_date_file_modified(&self) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tracks
            .iter()
            .map(|t| t.date_file_modified)
            .max()
            .unwrap_or(0))
    }

    async fn delete_tracks_in_missing_folders(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let folder_ids: Vec<i64> = state.folders.iter().map(|f| f.folder_id).collect();
        let doomed: Vec<i64> = state
            .folder_tracks
            .iter()
            .filter(|ft| !folder_ids.contains(&ft.folder_id))
            .map(|ft| ft.track_id)
            .collect();
        let before = state.tracks.len();
        state.tracks.retain(|t| !doomed.contains(&t.track_id));
        Ok((before - state.tracks.len()) as u64)
    }

    async fn newest_track_for_album_key(&self, album_key: &str) -> Result<Option<Track>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tracks
            .iter()
            .filter(|t| t.album_key == album_key)
            .max_by_key(|t| t.date_file_modified)
            .cloned())
    }

    async fn clear_album_artwork_flag(&self, album_key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for track in state.tracks.iter_mut() {
            if track.album_key == album_key {
                track.needs_album_artwork_indexing = 0;
            }
        }
        Ok(())
    }

    async fn add_folder_track(&self, folder_id: i64, track_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.folder_tracks.push(FolderTrack {
            folder_id,
            track_id,
        });
        Ok(())
    }

    async fn folder_tracks(&self) -> Result<Vec<FolderTrack>> {
        Ok(self.state.lock().unwrap().folder_tracks.clone())
    }

    async fn delete_orphaned_folder_tracks(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let track_ids: Vec<i64> = state.tracks.iter().map(|t| t.track_id).collect();
        let before = state.folder_tracks.len();
        state
            .folder_tracks
            .retain(|ft| track_ids.contains(&ft.track_id));
        Ok((before - state.folder_tracks.len()) as u64)
    }

    async fn add_removed_track(&self, removed: &RemovedTrack) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.removed_tracks.push(removed.clone());
        Ok(())
    }

    async fn removed_tracks(&self) -> Result<Vec<RemovedTrack>> {
        Ok(self.state.lock().unwrap().removed_tracks.clone())
    }

    async fn add_album_artwork(&self, artwork: &AlbumArtwork) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.next_artwork_id += 1;
        let mut stored = artwork.clone();
        stored.album_artwork_id = state.next_artwork_id;
        state.album_artworks.push(stored);
        Ok(())
    }

    async fn album_artworks(&self) -> Result<Vec<AlbumArtwork>> {
        Ok(self.state.lock().unwrap().album_artworks.clone())
    }

    async fn delete_orphaned_album_artworks(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let keys: Vec<String> = state.tracks.iter().map(|t| t.album_key.clone()).collect();
        let before = state.album_artworks.len();
        state.album_artworks.retain(|a| keys.contains(&a.album_key));
        Ok((before - state.album_artworks.len()) as u64)
    }

    async fn delete_album_artworks_for_flagged_tracks(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let flagged: Vec<String> = state
            .tracks
            .iter()
            .filter(|t| t.needs_album_artwork_indexing == 1)
            .map(|t| t.album_key.clone())
            .collect();
        let before = state.album_artworks.len();
        state
            .album_artworks
            .retain(|a| !flagged.contains(&a.album_key));
        Ok((before - state.album_artworks.len()) as u64)
    }

    async fn album_keys_needing_artwork(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let covered: Vec<&str> = state
            .album_artworks
            .iter()
            .map(|a| a.album_key.as_str())
            .collect();
        let mut keys: Vec<String> = Vec::new();
        for track in &state.tracks {
            if (!covered.contains(&track.album_key.as_str())
                || track.needs_album_artwork_indexing == 1)
                && !keys.contains(&track.album_key)
            {
                keys.push(track.album_key.clone());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_track_assigns_ids() {
        let repo = MemoryRepository::new();
        repo.add_track(&Track::new("/music/a.mp3")).await.unwrap();
        repo.add_track(&Track::new("/music/b.mp3")).await.unwrap();

        let a = repo.track_by_path("/music/a.mp3").await.unwrap().unwrap();
        let b = repo.track_by_path("/music/b.mp3").await.unwrap().unwrap();
        assert_ne!(a.track_id, b.track_id);
    }

    #[tokio::test]
    async fn test_duplicate_path_rejected() {
        let repo = MemoryRepository::new();
        repo.add_track(&Track::new("/music/a.mp3")).await.unwrap();
        assert!(repo.add_track(&Track::new("/music/a.mp3")).await.is_err());
    }

    #[tokio::test]
    async fn test_orphan_cleanup_matches_sql_semantics() {
        let repo = MemoryRepository::new();
        let folder = repo.add_folder("/music").await.unwrap();
        repo.add_track(&Track::new("/music/a.mp3")).await.unwrap();
        let track = repo.track_by_path("/music/a.mp3").await.unwrap().unwrap();
        repo.add_folder_track(folder.folder_id, track.track_id)
            .await
            .unwrap();

        repo.remove_folder(folder.folder_id).await.unwrap();
        assert_eq!(repo.delete_tracks_in_missing_folders().await.unwrap(), 1);
        assert_eq!(repo.delete_orphaned_folder_tracks().await.unwrap(), 1);
    }
}
