//! Text framing over the uuencode line format.
//!
//! A frame is whatever one socket read returned, up to the configured
//! buffer size. There is no length prefix or terminator, so a payload
//! larger than the read buffer arrives truncated and decodes as whatever
//! the truncated bytes happen to spell.

use super::{CodecError, uu};

/// Encodes `text` into a wire frame.
#[must_use]
pub fn encode(text: &str) -> Vec<u8> {
    uu::encode(text.as_bytes())
}

/// Strictly decodes a wire frame into text.
///
/// # Errors
///
/// Returns a [`CodecError`] if the frame is not valid uuencode or the
/// decoded bytes are not UTF-8.
pub fn try_decode(frame: &[u8]) -> Result<String, CodecError> {
    let bytes = uu::decode(frame)?;
    String::from_utf8(bytes).map_err(|err| CodecError::InvalidUtf8(err.utf8_error()))
}

/// Decodes a wire frame into text, never failing.
///
/// Frames that do not strictly decode are read as plain UTF-8 from the
/// original bytes, with invalid sequences replaced by U+FFFD.
#[must_use]
pub fn decode(frame: &[u8]) -> String {
    match try_decode(frame) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(%err, "frame is not uuencoded text, decoding as plain text");
            String::from_utf8_lossy(frame).into_owned()
        }
    }
}
