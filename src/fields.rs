//! Normalization of raw tag values into persistable track fields.
//!
//! Tag libraries hand back optional, untrimmed values; the database stores
//! plain integers and strings. These helpers define the mapping in one
//! place: missing numbers become 0, missing text becomes the empty string,
//! multi-valued text is delimiter-encoded via [`crate::keys`].

use crate::keys;

/// Map an optional numeric tag value to a persisted integer (missing -> 0).
pub fn number_field<N: Into<i64>>(value: Option<N>) -> i64 {
    value.map(Into::into).unwrap_or(0)
}

/// Map an optional text tag value to a persisted string (missing -> "",
/// otherwise trimmed).
pub fn text_field(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Map a list of text values to one delimited string (empty list -> "").
pub fn multi_text_field<S: AsRef<str>>(values: &[S]) -> String {
    keys::encode_values(values)
}
