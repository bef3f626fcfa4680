//! Chunked arena backing a [`Pool`](crate::Pool).
//!
//! The arena owns a preallocated head chunk plus growth chunks. Blocks are
//! bump-allocated from the active chunk; each carries a [`Header`] so a bare
//! pointer can be released and so leaks can be found by walking the chunks.
//!
//! Released space is recycled at chunk granularity:
//! - releasing the topmost block of a chunk rewinds that chunk's cursor,
//! - a chunk whose last block is released becomes empty; the head chunk and
//!   the active chunk rewind in place, any other chunk is retired into the
//!   scratch slot,
//! - the scratch slot keeps the largest retired chunk for the next growth and
//!   is handed back to the system by [`MemoryPool::reset_scratch_space`].

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

use crate::allocators::header::{Header, Tag, ALIGNMENT, HEADER_SIZE};
use crate::allocators::system::capacity_overflow;
use crate::api::stats::{LeakReport, LeakedBlock, PoolStats};
use crate::util::layout::{align_up, block_footprint};
use crate::util::size::{kb, mb};

/// Smallest chunk the arena will create.
pub(crate) const MIN_CHUNK_SIZE: usize = kb(1);

/// Largest configured chunk size; single oversized requests may exceed it.
pub(crate) const MAX_CHUNK_SIZE: usize = mb(512);

/// Index of the preallocated chunk.
const HEAD: usize = 0;

/// Clamp a configured chunk size into the supported range.
pub(crate) fn clamp_chunk_size(size: usize) -> usize {
    align_up(size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE), ALIGNMENT)
}

/// One contiguous region of the arena.
struct Chunk {
    /// Base pointer of the region
    base: NonNull<u8>,

    /// Size of the region in bytes
    capacity: usize,

    /// Offset of the first unused byte
    cursor: usize,

    /// Blocks carved from this chunk and not yet released
    live: usize,
}

impl Chunk {
    fn new(capacity: usize) -> Self {
        let layout =
            Layout::from_size_align(capacity, ALIGNMENT).unwrap_or_else(|_| capacity_overflow());

        // SAFETY: capacity is never zero (clamped or sized for a header)
        let raw = unsafe { alloc(layout) };
        let Some(base) = NonNull::new(raw) else {
            handle_alloc_error(layout)
        };

        Self {
            base,
            capacity,
            cursor: 0,
            live: 0,
        }
    }

    fn fits(&self, footprint: usize) -> bool {
        self.capacity - self.cursor >= footprint
    }

    #[cfg(any(debug_assertions, feature = "diagnostics", test))]
    fn contains(&self, addr: usize) -> bool {
        let start = self.base.as_ptr() as usize;
        addr >= start + HEADER_SIZE && addr < start + self.cursor
    }

    fn offset_of(&self, payload: NonNull<u8>) -> usize {
        payload.as_ptr() as usize - HEADER_SIZE - self.base.as_ptr() as usize
    }

    fn carve(&mut self, index: u32, size: usize, footprint: usize) -> NonNull<u8> {
        debug_assert!(self.fits(footprint));

        // SAFETY: cursor + footprint <= capacity, and cursor stays a multiple of ALIGNMENT
        let payload = unsafe {
            let at = NonNull::new_unchecked(self.base.as_ptr().add(self.cursor));
            Header::write(at, size, index, Tag::ArenaLive)
        };

        self.cursor += footprint;
        self.live += 1;
        payload
    }

    /// Visit every block between the chunk start and the cursor.
    fn walk(&self, mut visit: impl FnMut(NonNull<u8>, Header)) {
        let mut offset = 0;
        while offset < self.cursor {
            // SAFETY: every offset below the cursor reached this way starts a
            // header written by `carve`; rewinds only ever land on such offsets
            let (payload, header) = unsafe {
                let payload = NonNull::new_unchecked(self.base.as_ptr().add(offset + HEADER_SIZE));
                (payload, Header::read(payload))
            };
            offset += HEADER_SIZE + align_up(header.size, ALIGNMENT);
            visit(payload, header);
        }
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: same layout as in `new`, which already validated it
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.capacity, ALIGNMENT);
            dealloc(self.base.as_ptr(), layout);
        }
    }
}

/// The arena owned by a pool.
pub(crate) struct MemoryPool {
    /// Chunk table; a block's header stores its index here
    chunks: Vec<Option<Chunk>>,

    /// Vacated chunk indices available for reuse
    vacant: Vec<u32>,

    /// Index of the chunk currently bump-allocated from
    active: usize,

    /// Largest retired chunk, kept for the next growth
    scratch: Option<Chunk>,

    prealloc_size: usize,
    min_alloc_size: usize,

    live_blocks: usize,
    live_bytes: usize,
    total_allocations: u64,
    total_releases: u64,

    #[cfg(feature = "debug")]
    traces: crate::debug::backtrace::AllocationTraces,
}

impl MemoryPool {
    /// Build an arena with a `prealloc_size` head chunk and growth chunks of
    /// at least `min_alloc_size` bytes. Both sizes are clamped to
    /// `[MIN_CHUNK_SIZE, MAX_CHUNK_SIZE]`.
    pub fn make(prealloc_size: usize, min_alloc_size: usize) -> Self {
        let prealloc_size = clamp_chunk_size(prealloc_size);
        let min_alloc_size = clamp_chunk_size(min_alloc_size);

        Self {
            chunks: vec![Some(Chunk::new(prealloc_size))],
            vacant: Vec::new(),
            active: HEAD,
            scratch: None,
            prealloc_size,
            min_alloc_size,
            live_blocks: 0,
            live_bytes: 0,
            total_allocations: 0,
            total_releases: 0,
            #[cfg(feature = "debug")]
            traces: Default::default(),
        }
    }

    fn chunk(&self, index: usize) -> &Chunk {
        match self.chunks.get(index) {
            Some(Some(chunk)) => chunk,
            _ => unreachable!("arena chunk {index} is vacant"),
        }
    }

    fn chunk_mut(&mut self, index: usize) -> &mut Chunk {
        match self.chunks.get_mut(index) {
            Some(Some(chunk)) => chunk,
            _ => unreachable!("arena chunk {index} is vacant"),
        }
    }

    /// Allocate `size` bytes aligned to `ALIGNMENT`.
    ///
    /// Never fails: grows by new chunks as needed and aborts if the system
    /// allocator is exhausted.
    pub fn allocate(&mut self, size: usize) -> NonNull<u8> {
        let footprint = block_footprint(size).unwrap_or_else(|| capacity_overflow());

        if !self.chunk(self.active).fits(footprint) {
            self.grow(footprint);
        }

        let index = self.active;
        let payload = self.chunk_mut(index).carve(index as u32, size, footprint);

        self.live_blocks += 1;
        self.live_bytes += size;
        self.total_allocations += 1;

        #[cfg(feature = "debug")]
        {
            unsafe { crate::debug::poison::poison_uninit(payload.as_ptr(), size) };
            self.traces.record(payload.as_ptr() as usize);
        }

        payload
    }

    /// Make a chunk with room for `footprint` bytes the active one.
    fn grow(&mut self, footprint: usize) {
        let previous = self.active;

        let head = self.chunk(HEAD);
        if previous != HEAD && head.live == 0 && head.fits(footprint) {
            self.active = HEAD;
        } else {
            let chunk = match self.scratch.take() {
                Some(scratch) if scratch.fits(footprint) => scratch,
                other => {
                    self.scratch = other;
                    let capacity = self.min_alloc_size.max(align_up(footprint, ALIGNMENT));
                    Chunk::new(capacity)
                }
            };
            self.active = self.insert(chunk);
        }

        if previous != HEAD && self.chunk(previous).live == 0 {
            self.retire(previous);
        }
    }

    fn insert(&mut self, chunk: Chunk) -> usize {
        if let Some(index) = self.vacant.pop() {
            let index = index as usize;
            self.chunks[index] = Some(chunk);
            return index;
        }

        if self.chunks.len() >= u32::MAX as usize {
            capacity_overflow();
        }
        self.chunks.push(Some(chunk));
        self.chunks.len() - 1
    }

    /// Move an empty chunk out of the table into the scratch slot.
    ///
    /// The larger of the retired chunk and the current scratch chunk is kept;
    /// the other goes back to the system.
    fn retire(&mut self, index: usize) {
        let Some(mut chunk) = self.chunks[index].take() else {
            return;
        };
        debug_assert_eq!(chunk.live, 0);
        self.vacant.push(index as u32);

        chunk.cursor = 0;
        match &self.scratch {
            Some(scratch) if scratch.capacity >= chunk.capacity => drop(chunk),
            _ => self.scratch = Some(chunk),
        }
    }

    /// Release a block so its space can be reused.
    ///
    /// # Safety
    ///
    /// `payload` must have been returned by [`MemoryPool::allocate`] on this
    /// arena and must not have been released already.
    pub unsafe fn release(&mut self, payload: NonNull<u8>) {
        let header = Header::read(payload);
        debug_assert_eq!(header.tag(), Some(Tag::ArenaLive));
        Header::retag(payload, Tag::ArenaFreed);

        #[cfg(feature = "debug")]
        {
            crate::debug::poison::poison_freed(payload.as_ptr(), header.size);
            self.traces.forget(payload.as_ptr() as usize);
        }

        self.live_blocks -= 1;
        self.live_bytes -= header.size;
        self.total_releases += 1;

        let index = header.chunk as usize;
        let footprint = HEADER_SIZE + align_up(header.size, ALIGNMENT);
        let active = self.active;
        let chunk = self.chunk_mut(index);

        chunk.live -= 1;
        let offset = chunk.offset_of(payload);
        if offset + footprint == chunk.cursor {
            chunk.cursor = offset;
        }

        if chunk.live == 0 {
            chunk.cursor = 0;
            if index != HEAD && index != active {
                self.retire(index);
            }
        }
    }

    /// Hand the scratch chunk back to the system.
    ///
    /// Live blocks are never in the scratch chunk, so they are unaffected.
    pub fn reset_scratch_space(&mut self) {
        self.scratch = None;
    }

    /// List every block that was allocated and never released.
    pub fn report_leaks(&self) -> LeakReport {
        let mut blocks = Vec::new();

        for chunk in self.chunks.iter().flatten() {
            chunk.walk(|payload, header| {
                if header.tag() == Some(Tag::ArenaLive) {
                    let address = payload.as_ptr() as usize;
                    blocks.push(LeakedBlock {
                        address,
                        size: header.size,
                        chunk: header.chunk,
                        #[cfg(feature = "debug")]
                        backtrace: self.traces.get(address),
                        #[cfg(not(feature = "debug"))]
                        backtrace: None,
                    });
                }
            });
        }

        LeakReport::new(blocks)
    }

    /// True iff every block ever allocated has been released.
    pub fn is_empty(&self) -> bool {
        self.live_blocks == 0
    }

    /// Whether `payload` lies inside one of this arena's chunks.
    #[cfg(any(debug_assertions, feature = "diagnostics", test))]
    pub fn owns(&self, payload: NonNull<u8>) -> bool {
        let addr = payload.as_ptr() as usize;
        self.chunks.iter().flatten().any(|chunk| chunk.contains(addr))
    }

    /// Current statistics.
    pub fn stats(&self) -> PoolStats {
        let chunks = self.chunks.iter().flatten();
        let scratch_bytes = self.scratch.as_ref().map_or(0, |c| c.capacity);

        PoolStats {
            chunk_count: chunks.clone().count(),
            reserved_bytes: chunks.map(|c| c.capacity).sum::<usize>() + scratch_bytes,
            scratch_bytes,
            live_blocks: self.live_blocks,
            live_bytes: self.live_bytes,
            total_allocations: self.total_allocations,
            total_releases: self.total_releases,
            prealloc_size: self.prealloc_size,
            min_alloc_size: self.min_alloc_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Footprint of a 64-byte block; 12 of them fill a 1 KiB chunk.
    const BLOCK: usize = 64;

    fn fill(arena: &mut MemoryPool, count: usize) -> Vec<NonNull<u8>> {
        (0..count).map(|_| arena.allocate(BLOCK)).collect()
    }

    #[test]
    fn test_basic_allocation() {
        let mut arena = MemoryPool::make(kb(64), kb(32));

        let a = arena.allocate(24);
        let b = arena.allocate(8);
        assert_ne!(a, b);
        assert_eq!(a.as_ptr() as usize % ALIGNMENT, 0);
        assert_eq!(b.as_ptr() as usize % ALIGNMENT, 0);

        unsafe {
            a.as_ptr().write_bytes(0x11, 24);
            b.as_ptr().write_bytes(0x22, 8);
            assert_eq!(*a.as_ptr().add(23), 0x11);
        }

        assert!(!arena.is_empty());
        assert_eq!(arena.stats().live_blocks, 2);
        assert_eq!(arena.stats().live_bytes, 32);

        unsafe {
            arena.release(a);
            arena.release(b);
        }
        assert!(arena.is_empty());
    }

    #[test]
    fn test_release_top_rewinds() {
        let mut arena = MemoryPool::make(kb(64), kb(32));

        let _a = arena.allocate(BLOCK);
        let b = arena.allocate(BLOCK);
        unsafe { arena.release(b) };

        let c = arena.allocate(BLOCK);
        assert_eq!(b, c);
    }

    #[test]
    fn test_release_middle_does_not_rewind() {
        let mut arena = MemoryPool::make(kb(64), kb(32));

        let a = arena.allocate(BLOCK);
        let b = arena.allocate(BLOCK);
        unsafe { arena.release(a) };

        let c = arena.allocate(BLOCK);
        assert_ne!(a, c);
        assert_ne!(b, c);
        assert_eq!(arena.stats().live_blocks, 2);
    }

    #[test]
    fn test_empty_chunk_rewinds_to_start() {
        let mut arena = MemoryPool::make(kb(64), kb(32));

        let first = fill(&mut arena, 10);
        for ptr in first.iter().rev().skip(1) {
            unsafe { arena.release(*ptr) };
        }
        unsafe { arena.release(first[first.len() - 1]) };

        assert!(arena.is_empty());
        assert_eq!(arena.allocate(BLOCK), first[0]);
    }

    #[test]
    fn test_growth_adds_chunks() {
        let mut arena = MemoryPool::make(kb(1), kb(1));

        let ptrs = fill(&mut arena, 36);
        let stats = arena.stats();
        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.reserved_bytes, 3 * kb(1));

        for ptr in ptrs {
            unsafe { arena.release(ptr) };
        }
        assert!(arena.is_empty());
    }

    #[test]
    fn test_oversized_request_gets_own_chunk() {
        let mut arena = MemoryPool::make(kb(1), kb(1));

        let big = arena.allocate(kb(8));
        unsafe { big.as_ptr().write_bytes(0xEE, kb(8)) };

        let stats = arena.stats();
        assert_eq!(stats.chunk_count, 2);
        assert!(stats.reserved_bytes >= kb(1) + kb(8) + HEADER_SIZE);

        unsafe { arena.release(big) };
        assert!(arena.is_empty());
    }

    #[test]
    fn test_emptied_chunk_becomes_scratch_and_is_reused() {
        let mut arena = MemoryPool::make(kb(1), kb(1));

        let ptrs = fill(&mut arena, 36);
        for ptr in &ptrs[12..24] {
            unsafe { arena.release(*ptr) };
        }

        let stats = arena.stats();
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.scratch_bytes, kb(1));
        assert_eq!(stats.reserved_bytes, 3 * kb(1));

        // Chunk 2 is full, so the next block comes from the scratch chunk
        let reused = arena.allocate(BLOCK);
        let stats = arena.stats();
        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.scratch_bytes, 0);
        assert_eq!(stats.reserved_bytes, 3 * kb(1));

        unsafe { arena.release(reused) };
        for ptr in ptrs[..12].iter().chain(&ptrs[24..]) {
            unsafe { arena.release(*ptr) };
        }
        assert!(arena.is_empty());
    }

    #[test]
    fn test_reset_scratch_space_keeps_live_blocks() {
        let mut arena = MemoryPool::make(kb(1), kb(1));

        let ptrs = fill(&mut arena, 36);
        for (i, ptr) in ptrs.iter().enumerate() {
            unsafe { ptr.as_ptr().write_bytes(i as u8, BLOCK) };
        }
        for ptr in &ptrs[12..24] {
            unsafe { arena.release(*ptr) };
        }

        arena.reset_scratch_space();
        let stats = arena.stats();
        assert_eq!(stats.scratch_bytes, 0);
        assert_eq!(stats.reserved_bytes, 2 * kb(1));

        for (i, ptr) in ptrs.iter().enumerate().filter(|(i, _)| !(12..24).contains(i)) {
            unsafe { assert_eq!(*ptr.as_ptr().add(BLOCK - 1), i as u8) };
        }

        for ptr in ptrs[..12].iter().chain(&ptrs[24..]) {
            unsafe { arena.release(*ptr) };
        }
        assert!(arena.is_empty());
    }

    #[test]
    fn test_empty_head_is_reused_before_new_chunk() {
        let mut arena = MemoryPool::make(kb(1), kb(1));

        let head_blocks = fill(&mut arena, 12);
        let spill = arena.allocate(BLOCK);
        for ptr in &head_blocks {
            unsafe { arena.release(*ptr) };
        }

        let rest = fill(&mut arena, 11);
        assert_eq!(arena.stats().chunk_count, 2);

        let wrapped = arena.allocate(BLOCK);
        assert_eq!(wrapped, head_blocks[0]);
        assert_eq!(arena.stats().chunk_count, 2);

        unsafe {
            arena.release(wrapped);
            arena.release(spill);
        }
        for ptr in rest {
            unsafe { arena.release(ptr) };
        }
        assert!(arena.is_empty());
    }

    #[test]
    fn test_report_leaks_lists_outstanding_blocks() {
        let mut arena = MemoryPool::make(kb(1), kb(1));

        let ptrs = fill(&mut arena, 20);
        let kept = [ptrs[3], ptrs[15], ptrs[19]];
        for ptr in &ptrs {
            if !kept.contains(ptr) {
                unsafe { arena.release(*ptr) };
            }
        }

        let report = arena.report_leaks();
        assert_eq!(report.len(), 3);
        assert_eq!(report.total_bytes(), 3 * BLOCK);

        let mut addresses: Vec<usize> = report.blocks().iter().map(|b| b.address).collect();
        addresses.sort_unstable();
        let mut expected: Vec<usize> = kept.iter().map(|p| p.as_ptr() as usize).collect();
        expected.sort_unstable();
        assert_eq!(addresses, expected);

        for ptr in kept {
            unsafe { arena.release(ptr) };
        }
        assert!(arena.report_leaks().is_empty());
    }

    #[test]
    fn test_owns() {
        let mut arena = MemoryPool::make(kb(1), kb(1));
        let mut other = MemoryPool::make(kb(1), kb(1));

        let mine = arena.allocate(BLOCK);
        let theirs = other.allocate(BLOCK);
        assert!(arena.owns(mine));
        assert!(!arena.owns(theirs));

        unsafe {
            arena.release(mine);
            other.release(theirs);
        }
    }

    #[test]
    fn test_sizes_are_clamped() {
        let arena = MemoryPool::make(1, usize::MAX);
        let stats = arena.stats();
        assert_eq!(stats.prealloc_size, MIN_CHUNK_SIZE);
        assert_eq!(stats.min_alloc_size, MAX_CHUNK_SIZE);
        assert_eq!(stats.reserved_bytes, MIN_CHUNK_SIZE);
    }
}
