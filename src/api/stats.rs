//! Pool and fallback statistics, and teardown leak reports.

use crate::util::size::format_bytes;

/// Snapshot of a pool's arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Chunks currently in use (head chunk included, scratch excluded).
    pub chunk_count: usize,

    /// Bytes reserved from the system, scratch chunk included.
    pub reserved_bytes: usize,

    /// Bytes held by the scratch chunk.
    pub scratch_bytes: usize,

    /// Blocks allocated and not yet released.
    pub live_blocks: usize,

    /// Payload bytes of the live blocks.
    pub live_bytes: usize,

    /// Blocks ever allocated.
    pub total_allocations: u64,

    /// Blocks ever released.
    pub total_releases: u64,

    /// Size of the preallocated head chunk.
    pub prealloc_size: usize,

    /// Minimum size of a growth chunk.
    pub min_alloc_size: usize,
}

impl PoolStats {
    /// Fraction of reserved memory holding live payload.
    pub fn utilization(&self) -> f64 {
        if self.reserved_bytes == 0 {
            return 0.0;
        }
        self.live_bytes as f64 / self.reserved_bytes as f64
    }
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pool Statistics:")?;
        writeln!(f, "  Chunks:       {}", self.chunk_count)?;
        writeln!(f, "  Reserved:     {}", format_bytes(self.reserved_bytes))?;
        writeln!(f, "  Scratch:      {}", format_bytes(self.scratch_bytes))?;
        writeln!(f, "  Live blocks:  {}", self.live_blocks)?;
        writeln!(f, "  Live bytes:   {}", format_bytes(self.live_bytes))?;
        writeln!(f, "  Allocations:  {}", self.total_allocations)?;
        writeln!(f, "  Releases:     {}", self.total_releases)?;
        Ok(())
    }
}

/// Per-thread counters for blocks routed to the fallback allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackStats {
    /// Fallback blocks allocated on this thread and not yet freed.
    pub live_blocks: usize,

    /// Payload bytes of those blocks.
    pub live_bytes: usize,

    /// Fallback allocations performed on this thread.
    pub total_allocations: u64,

    /// Fallback frees performed on this thread.
    pub total_frees: u64,
}

impl FallbackStats {
    pub(crate) const fn new() -> Self {
        Self {
            live_blocks: 0,
            live_bytes: 0,
            total_allocations: 0,
            total_frees: 0,
        }
    }

    pub(crate) fn record_alloc(&mut self, size: usize) {
        self.live_blocks += 1;
        self.live_bytes += size;
        self.total_allocations += 1;
    }

    // Blocks may be freed on a different thread than they were allocated on,
    // so the live counters saturate instead of underflowing.
    pub(crate) fn record_dealloc(&mut self, size: usize) {
        self.live_blocks = self.live_blocks.saturating_sub(1);
        self.live_bytes = self.live_bytes.saturating_sub(size);
        self.total_frees += 1;
    }
}

/// A block that was never released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakedBlock {
    /// Payload address.
    pub address: usize,

    /// Requested size in bytes.
    pub size: usize,

    /// Arena chunk holding the block.
    pub chunk: u32,

    /// Allocation backtrace (only captured with the `debug` feature).
    pub backtrace: Option<String>,
}

/// Every block still outstanding in an arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeakReport {
    blocks: Vec<LeakedBlock>,
}

impl LeakReport {
    pub(crate) fn new(blocks: Vec<LeakedBlock>) -> Self {
        Self { blocks }
    }

    /// Outstanding blocks, in chunk order.
    pub fn blocks(&self) -> &[LeakedBlock] {
        &self.blocks
    }

    /// Number of outstanding blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if nothing leaked.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of outstanding payload sizes.
    pub fn total_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.size).sum()
    }
}

impl std::fmt::Display for LeakReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} outstanding block(s), {}",
            self.len(),
            format_bytes(self.total_bytes())
        )?;
        for block in &self.blocks {
            write!(
                f,
                "\n    0x{:x} ({} bytes, chunk {})",
                block.address, block.size, block.chunk
            )?;
            if let Some(ref trace) = block.backtrace {
                write!(f, "\n{}", trace)?;
            }
        }
        Ok(())
    }
}
