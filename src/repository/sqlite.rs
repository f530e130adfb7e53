//! SQLite-backed repository.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage. The schema
//! lives in `./migrations` and is applied on connect.

use std::path::Path;

use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{Result, ResultExt};
use crate::model::{AlbumArtwork, Folder, FolderTrack, RemovedTrack, Track};

use super::Repository;

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "chorale.db";

/// Build a SQLite database URL from an optional path.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Production [`Repository`] over a SQLite connection pool.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to (creating if necessary) the database at `db_url` and
    /// run pending migrations.
    pub async fn connect(db_url: &str) -> Result<Self> {
        if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
            sqlx::Sqlite::create_database(db_url)
                .await
                .with_context(format!("creating database {db_url}"))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .with_context(format!("connecting to {db_url}"))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)
            .with_context("running migrations")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn add_folder(&self, path: &str) -> Result<Folder> {
        let result = sqlx::query("INSERT INTO folder (path, show_in_collection) VALUES (?, 1)")
            .bind(path)
            .execute(&self.pool)
            .await?;

        Ok(Folder {
            folder_id: result.last_insert_rowid(),
            path: path.to_string(),
            show_in_collection: 1,
        })
    }

    async fn folder_by_path(&self, path: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>("SELECT * FROM folder WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(folder)
    }

    async fn remove_folder(&self, folder_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM folder WHERE folder_id = ?")
            .bind(folder_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn folders(&self) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>("SELECT * FROM folder ORDER BY folder_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(folders)
    }

    async fn add_track(&self, track: &Track) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO track (
                path, safe_path, file_name, file_size, date_added,
                date_file_modified, album_key, track_title, artists, genres,
                album_title, album_artists, track_number, track_count,
                disc_number, disc_count, year, duration_ms, bit_rate,
                sample_rate, lyrics, rating, needs_indexing,
                needs_album_artwork_indexing, indexing_success,
                indexing_failure_reason
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.path)
        .bind(&track.safe_path)
        .bind(&track.file_name)
        .bind(track.file_size)
        .bind(track.date_added)
        .bind(track.date_file_modified)
        .bind(&track.album_key)
        .bind(&track.track_title)
        .bind(&track.artists)
        .bind(&track.genres)
        .bind(&track.album_title)
        .bind(&track.album_artists)
        .bind(track.track_number)
        .bind(track.track_count)
        .bind(track.disc_number)
        .bind(track.disc_count)
        .bind(track.year)
        .bind(track.duration_ms)
        .bind(track.bit_rate)
        .bind(track.sample_rate)
        .bind(&track.lyrics)
        .bind(track.rating)
        .bind(track.needs_indexing)
        .bind(track.needs_album_artwork_indexing)
        .bind(track.indexing_success)
        .bind(&track.indexing_failure_reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_track(&self, track: &Track) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE track SET
                path = ?, safe_path = ?, file_name = ?, file_size = ?,
                date_added = ?, date_file_modified = ?, album_key = ?,
                track_title = ?, artists = ?, genres = ?, album_title = ?,
                album_artists = ?, track_number = ?, track_count = ?,
                disc_number = ?, disc_count = ?, year = ?, duration_ms = ?,
                bit_rate = ?, sample_rate = ?, lyrics = ?, rating = ?,
                needs_indexing = ?, needs_album_artwork_indexing = ?,
                indexing_success = ?, indexing_failure_reason = ?
            WHERE track_id = ?
            "#,
        )
        .bind(&track.path)
        .bind(&track.safe_path)
        .bind(&track.file_name)
        .bind(track.file_size)
        .bind(track.date_added)
        .bind(track.date_file_modified)
        .bind(&track.album_key)
        .bind(&track.track_title)
        .bind(&track.artists)
        .bind(&track.genres)
        .bind(&track.album_title)
        .bind(&track.album_artists)
        .bind(track.track_number)
        .bind(track.track_count)
        .bind(track.disc_number)
        .bind(track.disc_count)
        .bind(track.year)
        .bind(track.duration_ms)
        .bind(track.bit_rate)
        .bind(track.sample_rate)
        .bind(&track.lyrics)
        .bind(track.rating)
        .bind(track.needs_indexing)
        .bind(track.needs_album_artwork_indexing)
        .bind(track.indexing_success)
        .bind(&track.indexing_failure_reason)
        .bind(track.track_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_track(&self, track_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM track WHERE track_id = ?")
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn track_by_path(&self, path: &str) -> Result<Option<Track>> {
        let track = sqlx::query_as::<_, Track>("SELECT * FROM track WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(track)
    }

    async fn all_tracks(&self) -> Result<Vec<Track>> {
        let tracks = sqlx::query_as::<_, Track>("SELECT * FROM track ORDER BY track_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tracks)
    }

    async fn track_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM track")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn needs_indexing_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM track WHERE needs_indexing IS NULL OR needs_indexing <> 0",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn max_date_file_modified(&self) -> Result<i64> {
        let max = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(date_file_modified), 0) FROM track",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }

    async fn delete_tracks_in_missing_folders(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM track WHERE track_id IN (
                SELECT ft.track_id FROM folder_track ft
                WHERE ft.folder_id NOT IN (SELECT folder_id FROM folder)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn newest_track_for_album_key(&self, album_key: &str) -> Result<Option<Track>> {
        let track = sqlx::query_as::<_, Track>(
            "SELECT * FROM track WHERE album_key = ? ORDER BY date_file_modified DESC LIMIT 1",
        )
        .bind(album_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    async fn clear_album_artwork_flag(&self, album_key: &str) -> Result<()> {
        sqlx::query("UPDATE track SET needs_album_artwork_indexing = 0 WHERE album_key = ?")
            .bind(album_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_folder_track(&self, folder_id: i64, track_id: i64) -> Result<()> {
        sqlx::query("INSERT INTO folder_track (folder_id, track_id) VALUES (?, ?)")
            .bind(folder_id)
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn folder_tracks(&self) -> Result<Vec<FolderTrack>> {
        let rows = sqlx::query_as::<_, FolderTrack>("SELECT folder_id, track_id FROM folder_track")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_orphaned_folder_tracks(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM folder_track WHERE track_id NOT IN (SELECT track_id FROM track)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn add_removed_track(&self, removed: &RemovedTrack) -> Result<()> {
        sqlx::query(
            "INSERT INTO removed_track (track_id, path, safe_path, date_removed) VALUES (?, ?, ?, ?)",
        )
        .bind(removed.track_id)
        .bind(&removed.path)
        .bind(&removed.safe_path)
        .bind(removed.date_removed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn removed_tracks(&self) -> Result<Vec<RemovedTrack>> {
        let rows = sqlx::query_as::<_, RemovedTrack>(
            "SELECT track_id, path, safe_path, date_removed FROM removed_track",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_album_artwork(&self, artwork: &AlbumArtwork) -> Result<()> {
        sqlx::query("INSERT INTO album_artwork (album_key, artwork_id) VALUES (?, ?)")
            .bind(&artwork.album_key)
            .bind(&artwork.artwork_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn album_artworks(&self) -> Result<Vec<AlbumArtwork>> {
        let rows = sqlx::query_as::<_, AlbumArtwork>("SELECT * FROM album_artwork")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_orphaned_album_artworks(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM album_artwork WHERE album_key NOT IN (SELECT album_key FROM track)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_album_artworks_for_flagged_tracks(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM album_artwork WHERE album_key IN (
                SELECT album_key FROM track WHERE needs_album_artwork_indexing = 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn album_keys_needing_artwork(&self) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT album_key FROM track
            WHERE album_key NOT IN (SELECT album_key FROM album_artwork)
               OR needs_album_artwork_indexing = 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }
}
