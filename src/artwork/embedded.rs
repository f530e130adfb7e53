//! Embedded artwork: the picture already carried by extracted metadata.
//!
//! Extraction happens once per track during indexing, so this source
//! never re-reads the file; it just lifts the picture bytes out of the
//! [`FileMetadata`] record.

use crate::metadata::FileMetadata;

/// The embedded front cover, if the tag carried one.
pub fn embedded_artwork(metadata: &FileMetadata) -> Option<Vec<u8>> {
    metadata
        .picture
        .as_ref()
        .filter(|bytes| !bytes.is_empty())
        .cloned()
}
