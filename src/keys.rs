//! Multi-value field encoding and album key generation.
//!
//! Multi-valued tag fields (artists, genres, album artists) are stored in
//! single text columns. Each value is wrapped in a `;` boundary marker, so
//! `["A", "B"]` becomes `;A;;B;` and decodes back to the same list. The
//! raw format never leaks outside this module: callers go through
//! [`encode_values`] and [`decode_values`].

/// Boundary marker wrapped around every encoded value.
const DELIMITER: char = ';';

/// Escape character for delimiters occurring inside a value.
const ESCAPE: char = '\\';

/// Encode a list of values into one delimited string.
///
/// Blank values are dropped; an empty list encodes to the empty string.
/// Delimiter and escape characters inside a value are backslash-escaped,
/// so distinct value lists never encode to the same string.
pub fn encode_values<S: AsRef<str>>(values: &[S]) -> String {
    let mut encoded = String::new();
    for value in values {
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        encoded.push(DELIMITER);
        for c in value.chars() {
            if c == DELIMITER || c == ESCAPE {
                encoded.push(ESCAPE);
            }
            encoded.push(c);
        }
        encoded.push(DELIMITER);
    }
    encoded
}

/// Decode a delimited string back into its list of values.
///
/// Malformed input (stray characters between values, an unterminated
/// value, a trailing escape) decodes to the empty list.
pub fn decode_values(encoded: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = encoded.chars();
    loop {
        match chars.next() {
            None => return values,
            Some(DELIMITER) => {}
            Some(_) => return Vec::new(),
        }
        let mut value = String::new();
        loop {
            match chars.next() {
                Some(ESCAPE) => match chars.next() {
                    Some(c) => value.push(c),
                    None => return Vec::new(),
                },
                Some(DELIMITER) => break,
                Some(c) => value.push(c),
                None => return Vec::new(),
            }
        }
        values.push(value);
    }
}

/// Build the deterministic key grouping tracks into the same album.
///
/// The key is the delimiter encoding of `[album_title, ...album_artists]`.
/// An empty album title yields the empty key, which groups orphan singles
/// together as "no album".
pub fn generate_album_key<S: AsRef<str>>(album_title: &str, album_artists: &[S]) -> String {
    if album_title.trim().is_empty() {
        return String::new();
    }

    let mut parts: Vec<&str> = vec![album_title];
    for artist in album_artists {
        parts.push(artist.as_ref());
    }
    encode_values(&parts)
}
