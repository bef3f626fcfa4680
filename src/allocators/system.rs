//! Fallback allocator used when no pool is attached to the calling thread.
//!
//! Thin wrapper around `std::alloc` that prefixes each block with a
//! [`Header`] so a bare pointer can be freed later without its layout.
//! Counters are per-thread: nothing here is shared between threads.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::cell::Cell;
use std::ptr::NonNull;

use crate::allocators::header::{Header, Tag, ALIGNMENT, HEADER_SIZE};
use crate::api::stats::FallbackStats;
use crate::util::layout::{align_up, block_layout};

thread_local! {
    static COUNTERS: Cell<FallbackStats> = const { Cell::new(FallbackStats::new()) };
}

#[cold]
pub(crate) fn capacity_overflow() -> ! {
    panic!("[tlpool] allocation size overflows usize");
}

/// Allocate `size` bytes from the system allocator.
///
/// Aborts through `handle_alloc_error` if the system is out of memory.
pub(crate) fn allocate(size: usize) -> NonNull<u8> {
    let layout = block_layout(size).unwrap_or_else(|| capacity_overflow());

    // SAFETY: block layouts are never zero-sized (they include the header)
    let raw = unsafe { alloc(layout) };
    let Some(base) = NonNull::new(raw) else {
        handle_alloc_error(layout)
    };

    #[cfg(feature = "debug")]
    unsafe {
        crate::debug::poison::poison_uninit(base.as_ptr().add(HEADER_SIZE), size);
    }

    COUNTERS.with(|c| {
        let mut stats = c.get();
        stats.record_alloc(size);
        c.set(stats);
    });

    // SAFETY: `base` is fresh, aligned to ALIGNMENT and at least HEADER_SIZE long
    unsafe { Header::write(base, size, 0, Tag::System) }
}

/// Return a block to the system allocator.
///
/// # Safety
///
/// `payload` must come from [`allocate`], must not have been freed yet, and
/// `header` must be the header read from it.
pub(crate) unsafe fn deallocate(payload: NonNull<u8>, header: Header) {
    let total = HEADER_SIZE + align_up(header.size, ALIGNMENT);
    let layout = Layout::from_size_align_unchecked(total, ALIGNMENT);

    #[cfg(feature = "debug")]
    crate::debug::poison::poison_freed(payload.as_ptr(), header.size);

    dealloc(Header::locate(payload).as_ptr().cast::<u8>(), layout);

    COUNTERS.with(|c| {
        let mut stats = c.get();
        stats.record_dealloc(header.size);
        c.set(stats);
    });
}

/// Snapshot of the calling thread's fallback counters.
pub(crate) fn stats() -> FallbackStats {
    COUNTERS.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_roundtrip_updates_counters() {
        let before = stats();

        let ptr = allocate(100);
        assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0xAB, 100);
        }

        let during = stats();
        assert_eq!(during.live_blocks, before.live_blocks + 1);
        assert_eq!(during.live_bytes, before.live_bytes + 100);

        unsafe {
            let header = Header::read(ptr);
            assert_eq!(header.tag(), Some(Tag::System));
            assert_eq!(header.size, 100);
            deallocate(ptr, header);
        }

        let after = stats();
        assert_eq!(after.live_blocks, before.live_blocks);
        assert_eq!(after.total_frees, before.total_frees + 1);
    }

    #[test]
    fn test_zero_sized_request() {
        let ptr = allocate(0);
        unsafe {
            let header = Header::read(ptr);
            assert_eq!(header.size, 0);
            deallocate(ptr, header);
        }
    }
}
