//! Half-open byte range helpers.
//!
//! Ranges are plain [`Range<u64>`] values. An inverted range (`start > end`)
//! is treated as empty rather than rejected, so clamping never fails.

use std::ops::Range;

use crate::error::{ReadError, ReadResult};

/// Clamps `range` to `[0, length)`.
///
/// The result is always a subset of `[0, length)` and never longer than
/// `range`. Ranges lying entirely past `length` collapse to `length..length`.
pub fn clamp(range: Range<u64>, length: u64) -> Range<u64> {
    intersect(range, 0..length)
}

/// Intersection of two ranges, empty when they do not overlap.
pub fn intersect(a: Range<u64>, b: Range<u64>) -> Range<u64> {
    let end = a.end.min(b.end);
    let start = a.start.max(b.start).min(end);
    start..end
}

/// Number of bytes covered by `range`.
pub fn count(range: &Range<u64>) -> u64 {
    range.end.saturating_sub(range.start)
}

/// Whether `inner` lies completely within `outer`.
pub fn contains(outer: &Range<u64>, inner: &Range<u64>) -> bool {
    inner.start >= outer.start && inner.end <= outer.end
}

/// Translates an absolute range into one relative to `offset`.
///
/// Fails with [`ReadError::Decoding`] when `range` starts before `offset`.
pub fn shift_down(range: Range<u64>, offset: u64) -> ReadResult<Range<u64>> {
    if range.start < offset {
        return Err(ReadError::decoding(format!(
            "range {}..{} starts before offset {}",
            range.start, range.end, offset
        )));
    }
    Ok(range.start - offset..range.end.saturating_sub(offset))
}

/// Borrows the part of `data` covered by `range`, or all of it for `None`.
///
/// The range is clamped to the length of `data` first.
pub fn slice(data: &[u8], range: Option<Range<u64>>) -> &[u8] {
    match range {
        None => data,
        Some(range) => {
            let range = clamp(range, data.len() as u64);
            &data[range.start as usize..range.end as usize]
        }
    }
}
