//! Album artwork resolution, caching, and indexing.
//!
//! Artwork for an album is obtained through a strict-priority fallback
//! chain with three sources:
//!
//! 1. **Embedded** - the picture carried in the file's tag metadata
//! 2. **External** - a cover image file next to the audio file
//! 3. **Online** - an album-info lookup against a remote provider
//!
//! Each source yields `Option` rather than an error so the next source
//! can try. Resolved images are transcoded and stored in a content-
//! addressed disk cache owned by [`ArtworkCache`]; [`indexer`] keeps the
//! cache and the `album_artwork` table consistent with the track table.

pub mod cache;
pub mod embedded;
pub mod external;
pub mod indexer;
pub mod online;
pub mod resolver;

pub use cache::{ArtworkCache, ArtworkId, ImageTranscoder, JpegTranscoder};
pub use indexer::AlbumArtworkIndexer;
pub use online::{AlbumInfoProvider, LastFmClient};
pub use resolver::ArtworkResolver;
