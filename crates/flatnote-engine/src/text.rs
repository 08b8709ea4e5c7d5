//! Character-offset helpers.
//!
//! Every offset the engine exposes (mention ranges, caret offsets, edit
//! ranges) counts Unicode scalar values, not bytes. Rust strings and the
//! xi-rope buffer are byte-addressed, so conversions go through here.

use std::ops::Range;

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the character at `char_idx`, clamped to the end of `s`.
pub fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Character index of the byte position `byte_idx` (clamped, and rounded
/// down to the enclosing char boundary).
pub fn char_offset(s: &str, byte_idx: usize) -> usize {
    let mut byte_idx = byte_idx.min(s.len());
    while !s.is_char_boundary(byte_idx) {
        byte_idx -= 1;
    }
    s[..byte_idx].chars().count()
}

/// Convert a character range into a byte range of `s`.
pub fn byte_range(s: &str, range: &Range<usize>) -> Range<usize> {
    byte_offset(s, range.start)..byte_offset(s, range.end)
}

/// Slice `s` by character range. Returns `None` when the range is inverted or
/// extends past the end of `s`.
pub fn char_slice<'a>(s: &'a str, range: &Range<usize>) -> Option<&'a str> {
    if range.start > range.end || range.end > char_len(s) {
        return None;
    }
    Some(&s[byte_range(s, range)])
}
