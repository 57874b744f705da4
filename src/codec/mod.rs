//! Wire codec: uuencoded text frames.
//!
//! Every frame on the wire is the uuencoding of a UTF-8 payload. [`uu`]
//! implements the line format itself; [`frame`] layers text semantics and
//! the plain-text fallback on top of it.

pub mod frame;
pub mod uu;

pub use frame::{decode, encode, try_decode};

/// Reasons a frame fails strict decoding.
///
/// These never escape a connection: [`frame::decode`] swallows them and
/// falls back to lossy plain text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A data character outside the uuencode alphabet (`0x20..=0x60`).
    #[error("illegal uuencode character 0x{0:02x}")]
    IllegalChar(u8),

    /// Non-whitespace bytes after the payload announced by the length
    /// character.
    #[error("trailing garbage 0x{0:02x} after uuencoded payload")]
    TrailingGarbage(u8),

    /// The uudecoded bytes are not valid UTF-8.
    #[error("decoded payload is not utf-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
