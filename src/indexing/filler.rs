//! Populating track rows from extracted metadata.
//!
//! [`TrackFiller`] combines the metadata extractor with field
//! normalization to fill a [`Track`]. Extraction failure never
//! propagates: the row is stamped with `indexing_success = 0`, the
//! captured failure reason, and `needs_indexing = 1` so the track is
//! retried on a later pass.

use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::fields;
use crate::keys;
use crate::metadata::MetadataExtractor;
use crate::model::Track;
use crate::ticks;

/// Fills track rows from file metadata.
pub struct TrackFiller<'a> {
    extractor: &'a dyn MetadataExtractor,
}

impl<'a> TrackFiller<'a> {
    pub fn new(extractor: &'a dyn MetadataExtractor) -> Self {
        Self { extractor }
    }

    /// Fill the track from its file on disk.
    ///
    /// With `fill_only_essential_metadata` set, only the fields needed to
    /// compute the album key and detect staleness are populated (used for
    /// quick re-checks); otherwise the full field set is written.
    pub fn fill(&self, track: &mut Track, fill_only_essential_metadata: bool) {
        match self.try_fill(track, fill_only_essential_metadata) {
            Ok(()) => {
                track.needs_indexing = Some(0);
                track.needs_album_artwork_indexing = 1;
                track.indexing_success = Some(1);
                track.indexing_failure_reason = None;
            }
            Err(e) => {
                warn!(path = %track.path, error = %e, "failed to fill track metadata");
                track.needs_indexing = Some(1);
                track.indexing_success = Some(0);
                track.indexing_failure_reason = Some(e.to_string());
            }
        }
    }

    fn try_fill(&self, track: &mut Track, fill_only_essential_metadata: bool) -> Result<()> {
        let path = Path::new(&track.path);

        let file_metadata = std::fs::metadata(path)?;
        track.file_size = file_metadata.len() as i64;
        track.date_file_modified = file_metadata
            .modified()
            .map(ticks::system_time_to_ticks)
            .unwrap_or(0);

        let metadata = self.extractor.extract(path)?;

        track.album_title = fields::text_field(metadata.album.as_deref());
        track.album_artists = fields::multi_text_field(&metadata.album_artists);
        track.artists = fields::multi_text_field(&metadata.artists);
        track.album_key = keys::generate_album_key(&track.album_title, &metadata.album_artists);

        if fill_only_essential_metadata {
            return Ok(());
        }

        track.track_title = fields::text_field(metadata.title.as_deref());
        track.genres = fields::multi_text_field(&metadata.genres);
        track.track_number = fields::number_field(metadata.track_number);
        track.track_count = fields::number_field(metadata.track_count);
        track.disc_number = fields::number_field(metadata.disc_number);
        track.disc_count = fields::number_field(metadata.disc_count);
        track.year = fields::number_field(metadata.year);
        track.duration_ms = metadata.duration_ms.map(|d| d as i64).unwrap_or(0);
        track.bit_rate = fields::number_field(metadata.bit_rate);
        track.sample_rate = fields::number_field(metadata.sample_rate);
        track.lyrics = fields::text_field(metadata.lyrics.as_deref());
        track.rating = fields::number_field(metadata.rating);

        Ok(())
    }
}
