//! Pool configuration.

use crate::allocators::arena::clamp_chunk_size;
use crate::util::size::{kb, mb};

/// Size of the preallocated head chunk of a pool made by [`Pool::create`](crate::Pool::create).
pub const DEFAULT_PREALLOC_SIZE: usize = kb(64);

/// Minimum growth chunk of a pool made by [`Pool::create`](crate::Pool::create).
pub const DEFAULT_MIN_ALLOC_SIZE: usize = kb(32);

/// Configuration for a pool's arena.
///
/// Sizes are clamped to the range the arena supports (1 KiB to 512 MiB) when
/// the pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Size of the preallocated head chunk (default: 64 KB)
    pub prealloc_size: usize,

    /// Minimum size of each growth chunk (default: 32 KB)
    pub min_alloc_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            prealloc_size: DEFAULT_PREALLOC_SIZE,
            min_alloc_size: DEFAULT_MIN_ALLOC_SIZE,
        }
    }
}

impl PoolConfig {
    /// A config for short jobs that allocate little.
    pub fn small() -> Self {
        Self {
            prealloc_size: kb(4),
            min_alloc_size: kb(4),
        }
    }

    /// A config for large translation units.
    pub fn large() -> Self {
        Self {
            prealloc_size: mb(1),
            min_alloc_size: kb(256),
        }
    }

    /// Builder pattern: set the head chunk size.
    pub fn with_prealloc_size(mut self, size: usize) -> Self {
        self.prealloc_size = size;
        self
    }

    /// Builder pattern: set the minimum growth chunk size.
    pub fn with_min_alloc_size(mut self, size: usize) -> Self {
        self.min_alloc_size = size;
        self
    }

    /// The sizes the arena will actually use.
    pub fn effective(&self) -> Self {
        Self {
            prealloc_size: clamp_chunk_size(self.prealloc_size),
            min_alloc_size: clamp_chunk_size(self.min_alloc_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.prealloc_size, 65536);
        assert_eq!(config.min_alloc_size, 32768);
        assert_eq!(config.effective(), config);
    }

    #[test]
    fn test_effective_clamps() {
        let config = PoolConfig::default()
            .with_prealloc_size(10)
            .with_min_alloc_size(kb(1) + 1);
        let effective = config.effective();
        assert_eq!(effective.prealloc_size, kb(1));
        assert_eq!(effective.min_alloc_size, kb(1) + 16);

        let huge = PoolConfig::default().with_prealloc_size(usize::MAX).effective();
        assert_eq!(huge.prealloc_size, mb(512));
    }
}
