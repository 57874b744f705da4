//! uuencode line format, compatible with Python's `binascii.b2a_uu` /
//! `binascii.a2b_uu`.
//!
//! A line holds at most [`LINE_CAPACITY`] input bytes:
//!
//! ```text
//! <len char> <4 chars per 3-byte group> '\n'
//! ```
//!
//! Every character is `0x20 + sextet`. A zero sextet is written as a
//! space; the decoder also accepts a backtick for zero. Payloads longer
//! than one line are split across several lines of the same frame.
//!
//! Single lines match `binascii` byte for byte. Multi-line frames are an
//! intentional extension: [`decode`] decodes every line and concatenates
//! them, whereas `a2b_uu` only decodes the first line of its input and
//! rejects anything after it as trailing garbage.

use super::CodecError;

/// Maximum number of input bytes carried by one encoded line.
pub const LINE_CAPACITY: usize = 45;

/// Lowest and highest legal data characters.
const ALPHABET_START: u8 = b' ';
const ALPHABET_END: u8 = b'`';

/// Encodes `data` as one or more uuencoded lines.
///
/// Empty input encodes to a single zero-length line (`" \n"`).
#[must_use]
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(data.len()));
    if data.is_empty() {
        encode_line(&[], &mut out);
        return out;
    }
    for line in data.chunks(LINE_CAPACITY) {
        encode_line(line, &mut out);
    }
    out
}

/// Decodes every line of `data`, concatenating the payloads.
///
/// Blank lines are skipped. A line shorter than its length character
/// announces is padded with zero bits, matching `a2b_uu`.
///
/// # Errors
///
/// Returns [`CodecError::IllegalChar`] for a data character outside the
/// uuencode alphabet and [`CodecError::TrailingGarbage`] for non-whitespace
/// after a line's payload.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(data.len() / 4 * 3);
    for line in data.split(|&b| b == b'\n').filter(|line| !line.is_empty()) {
        decode_line(line, &mut out)?;
    }
    Ok(out)
}

/// Exact number of bytes [`encode`] produces for `len` input bytes.
#[must_use]
pub fn encoded_len(len: usize) -> usize {
    let full_lines = len / LINE_CAPACITY;
    let tail = len % LINE_CAPACITY;
    let line_len = |n: usize| 2 + n.div_ceil(3) * 4;
    let mut total = full_lines * line_len(LINE_CAPACITY);
    if tail > 0 || full_lines == 0 {
        total += line_len(tail);
    }
    total
}

fn encode_line(line: &[u8], out: &mut Vec<u8>) {
    out.push(to_char(line.len() as u8));
    for group in line.chunks(3) {
        let mut block = [0u8; 3];
        for (slot, byte) in block.iter_mut().zip(group) {
            *slot = *byte;
        }
        let [a, b, c] = block;
        out.push(to_char(a >> 2));
        out.push(to_char(((a & 0x03) << 4) | (b >> 4)));
        out.push(to_char(((b & 0x0f) << 2) | (c >> 6)));
        out.push(to_char(c & 0x3f));
    }
    out.push(b'\n');
}

fn decode_line(line: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
    let Some((&len_char, rest)) = line.split_first() else {
        return Ok(());
    };
    // The length character is masked, not validated.
    let mut remaining = usize::from(len_char.wrapping_sub(ALPHABET_START) & 0x3f);
    let mut chars = rest.iter();
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    while remaining > 0 {
        let sextet = match chars.next() {
            None | Some(b'\r') => 0,
            Some(&c) if (ALPHABET_START..=ALPHABET_END).contains(&c) => {
                c.wrapping_sub(ALPHABET_START) & 0x3f
            }
            Some(&c) => return Err(CodecError::IllegalChar(c)),
        };
        acc = (acc << 6) | u32::from(sextet);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
            acc &= (1 << bits) - 1;
            remaining -= 1;
        }
    }

    match chars.find(|&&c| !matches!(c, b' ' | b'`' | b'\r' | b'\n')) {
        Some(&c) => Err(CodecError::TrailingGarbage(c)),
        None => Ok(()),
    }
}

const fn to_char(sextet: u8) -> u8 {
    ALPHABET_START + (sextet & 0x3f)
}
