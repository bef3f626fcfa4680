//! Layout utilities.

use std::alloc::Layout;

use crate::allocators::header::{ALIGNMENT, HEADER_SIZE};

/// Align a size up to the given alignment.
#[inline]
pub const fn align_up(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

/// Bytes a block occupies once its header and payload padding are included.
///
/// Returns `None` when the request overflows `usize`.
#[inline]
pub fn block_footprint(size: usize) -> Option<usize> {
    let padded = size.checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1);
    padded.checked_add(HEADER_SIZE)
}

/// Layout of a fallback block carrying `size` payload bytes.
pub fn block_layout(size: usize) -> Option<Layout> {
    let total = block_footprint(size)?;
    Layout::from_size_align(total, ALIGNMENT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 16), 32);
    }

    #[test]
    fn test_block_footprint() {
        assert_eq!(block_footprint(0), Some(HEADER_SIZE));
        assert_eq!(block_footprint(1), Some(HEADER_SIZE + 16));
        assert_eq!(block_footprint(64), Some(HEADER_SIZE + 64));
        assert_eq!(block_footprint(usize::MAX), None);
    }

    #[test]
    fn test_block_layout_alignment() {
        let layout = block_layout(10).unwrap();
        assert_eq!(layout.align(), ALIGNMENT);
        assert_eq!(layout.size(), HEADER_SIZE + 16);
    }
}
