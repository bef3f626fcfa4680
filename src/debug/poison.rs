//! Memory poisoning for debugging.
//!
//! Fills fresh and released blocks with known patterns so reads of
//! uninitialized or released pool memory stand out.

/// Pattern used to poison released memory.
pub const FREED_PATTERN: u8 = 0xCD;

/// Pattern used to poison freshly allocated memory.
pub const UNINIT_PATTERN: u8 = 0xAB;

/// Poison a region of memory with the freed pattern.
///
/// # Safety
///
/// The memory region must be valid and writable.
pub unsafe fn poison_freed(ptr: *mut u8, size: usize) {
    std::ptr::write_bytes(ptr, FREED_PATTERN, size);
}

/// Poison a region of memory with the uninitialized pattern.
///
/// # Safety
///
/// The memory region must be valid and writable.
pub unsafe fn poison_uninit(ptr: *mut u8, size: usize) {
    std::ptr::write_bytes(ptr, UNINIT_PATTERN, size);
}
