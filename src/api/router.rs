//! Allocation routing.
//!
//! [`alloc_memory`] and [`free_memory`] look at the calling thread's slot:
//! with a pool attached they use its arena, otherwise the system allocator.
//! No routing information travels with the pointer, so a block must be freed
//! under the same attachment it was allocated under.

use std::ptr::NonNull;

use crate::allocators::arena::MemoryPool;
use crate::allocators::header::{Header, Tag};
use crate::allocators::system;
use crate::api::pool::PoolId;
use crate::api::stats::FallbackStats;
use crate::core::tls;
use crate::diagnostics::context::DiagContext;
use crate::diagnostics::macros::{pool_trace, tp_emit};

/// Allocate `size` bytes, aligned to 16.
///
/// Served by the pool attached to the calling thread, or by the system
/// allocator if there is none. Never returns null; out-of-memory aborts.
#[inline]
pub fn alloc_memory(size: usize) -> NonNull<u8> {
    let pooled = tls::with_attached(|arena, id| {
        let ptr = arena.allocate(size);
        pool_trace!("ALLOC  {} {:p} ({} bytes)", id, ptr, size);
        ptr
    });
    if let Some(ptr) = pooled {
        return ptr;
    }

    let ptr = system::allocate(size);
    pool_trace!("ALLOC  system {:p} ({} bytes)", ptr, size);
    ptr
}

/// Free a block returned by [`alloc_memory`].
///
/// The block goes to the attached pool if there is one, otherwise to the
/// system allocator. A block whose header shows it came from the other kind
/// of allocator is reported as `TP201` and leaked, as is an arena block
/// released again while its chunk is still held by the pool and before its
/// space has been handed out again. Checked builds
/// also report arena blocks freed into a different pool than the one they
/// came from.
///
/// # Safety
///
/// `ptr` must come from [`alloc_memory`] and must not have been freed yet.
/// The header is read before any check, so a repeated free is only detected
/// while the block's memory is still owned by the pool and not yet reused.
/// The same pool (or no pool) must be attached to the calling thread as when
/// the block was allocated.
pub unsafe fn free_memory(ptr: NonNull<u8>) {
    let header = Header::read(ptr);

    let routed = tls::with_attached(|arena, id| {
        if header.tag() == Some(Tag::ArenaLive) && owned_by(arena, ptr) {
            pool_trace!("FREE   {} {:p}", id, ptr);
            arena.release(ptr);
            None
        } else {
            Some(id)
        }
    });

    match routed {
        Some(None) => {}
        Some(Some(attached)) => misrouted(ptr, header, Some(attached)),
        None if header.tag() == Some(Tag::System) => {
            pool_trace!("FREE   system {:p}", ptr);
            system::deallocate(ptr, header);
        }
        None => misrouted(ptr, header, None),
    }
}

/// Counters for blocks the calling thread routed to the system allocator.
pub fn fallback_stats() -> FallbackStats {
    system::stats()
}

#[inline]
fn owned_by(arena: &MemoryPool, ptr: NonNull<u8>) -> bool {
    #[cfg(any(debug_assertions, feature = "diagnostics"))]
    {
        arena.owns(ptr)
    }
    #[cfg(not(any(debug_assertions, feature = "diagnostics")))]
    {
        let _ = (arena, ptr);
        true
    }
}

#[cold]
fn misrouted(ptr: NonNull<u8>, header: Header, attached: Option<PoolId>) {
    let origin = match header.tag() {
        Some(Tag::ArenaLive) if attached.is_some() => "a different pool",
        Some(Tag::ArenaLive) => "a pool",
        Some(Tag::ArenaFreed) => "a pool, already released",
        Some(Tag::System) => "the system allocator",
        None => "unknown, header is corrupt",
    };
    tp_emit!(
        TP201,
        "{} block={:p} size={} origin=\"{}\"",
        DiagContext::capture(None),
        ptr,
        header.size,
        origin
    );
}
