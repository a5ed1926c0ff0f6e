//! Half-open index range helpers over the point-level arrays
//!
//! Points, diameters and perimeters are three independent vectors kept
//! index-aligned by convention only. None of these helpers check that the
//! arrays agree with one another: a caller slicing or appending one of them
//! must do the same to the others.

use std::ops::Range;

/// Copy `data[range]` into a new vector
///
/// Returns an empty vector when `data` is empty, whatever the bounds, so that
/// optional arrays (perimeters) can be sliced with the same range as the
/// mandatory ones. A range outside a non-empty array also yields an empty
/// vector.
pub fn copy_span<T: Clone>(data: &[T], range: Range<usize>) -> Vec<T> {
    if data.is_empty() {
        return Vec::new();
    }
    match data.get(range.clone()) {
        Some(slice) => slice.to_vec(),
        None => {
            tracing::debug!(
                "Range {:?} is outside an array of length {}",
                range,
                data.len()
            );
            Vec::new()
        }
    }
}

/// Append `src[offset..]` to `dest`
///
/// An offset past the end of `src` appends nothing.
pub fn append_range<T: Clone>(dest: &mut Vec<T>, src: &[T], offset: usize) {
    if let Some(tail) = src.get(offset..) {
        dest.extend_from_slice(tail);
    }
}

/// Borrow `data[range]`, or an empty slice when the array is empty or too short
pub fn span<T>(data: &[T], range: Range<usize>) -> &[T] {
    data.get(range).unwrap_or(&[])
}
