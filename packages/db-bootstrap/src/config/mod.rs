//! Connection-string classification, parsing, and bootstrap settings.

use percent_encoding::{percent_decode_str, AsciiSet, NON_ALPHANUMERIC};

use crate::error::DsnError;

pub mod db;
pub mod mysql_dsn;
pub mod postgres_dsn;

/// RFC 3986 unreserved characters stay literal, everything else is escaped.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-decode one DSN component, rejecting malformed escapes instead of
/// passing them through.
pub(crate) fn percent_decode(raw: &str) -> Result<String, DsnError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(DsnError::InvalidEscape(raw.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| DsnError::InvalidEscape(raw.to_string()))
}
