//! Per-token percent-encoding for path segments and regexp escaping for
//! search patterns.

use crate::error::Error;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

// Everything except the unreserved set `A-Z a-z 0-9 - _ . ~` is escaped,
// which also covers the path-language reserved `/ ; & : , ( ) = ! ' *`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const REGEXP_SPECIALS: &[char] = &[
    '-', '[', ']', '/', '{', '}', '(', ')', '*', '+', '?', '.', '\\', '^', '$',
];

/// Encode one path token. Hex digits are uppercase.
#[must_use]
pub fn component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Decode one path token.
pub fn decode(value: &str) -> Result<String, Error> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::malformed_uri(format!("'{value}' is not valid percent-encoded UTF-8")))
}

/// Escape regular-expression metacharacters so `value` matches literally.
#[must_use]
pub fn regexp(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if REGEXP_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

///
/// TESTS
///
