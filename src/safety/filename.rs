//! Client-supplied filename validation.
//!
//! Every path written into a scratch directory comes from the request body,
//! so this is the only thing standing between a client and path traversal.

use crate::error::BuildError;

/// Validate a relative path and return its segments.
///
/// Accepts `[0-9A-Za-z-_.]+` segments joined by single `/`. Rejects `.` and
/// `..` segments, absolute paths, empty segments, and any other character.
pub fn validate_filename(name: &str) -> Result<Vec<&str>, BuildError> {
    let segments: Vec<&str> = name.split('/').collect();
    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && *segment != "."
            && *segment != ".."
            && segment.chars().all(is_filename_char)
    });

    if valid {
        Ok(segments)
    } else {
        Err(BuildError::InvalidFilename(name.to_string()))
    }
}

fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}
