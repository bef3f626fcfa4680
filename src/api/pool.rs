//! The pool handle and the attachment protocol.

use std::fmt;
use std::num::NonZeroU64;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::allocators::arena::MemoryPool;
use crate::api::config::PoolConfig;
use crate::api::scope::AttachGuard;
use crate::api::stats::{LeakReport, PoolStats};
use crate::core::tls::{self, Attachment};
use crate::diagnostics::context::DiagContext;
use crate::diagnostics::macros::{pool_trace, tp_emit};

/// Process-unique identifier of a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId(NonZeroU64);

impl PoolId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let raw = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// A memory pool that can be attached to the current thread.
///
/// While a pool is attached, [`alloc_memory`](crate::alloc_memory) and
/// [`free_memory`](crate::free_memory) on that thread are served by the
/// pool's arena; otherwise they go to the system allocator.
///
/// A pool never leaves the thread that created it (`Pool` is neither `Send`
/// nor `Sync`). Dropping it checks the teardown invariants: it must not be
/// attached, and every block allocated from it must have been freed.
///
/// # Example
///
/// ```rust
/// use tlpool::{alloc_memory, free_memory, Pool};
///
/// let mut pool = Pool::create();
/// pool.attach_to_thread();
///
/// let block = alloc_memory(64);
/// unsafe { free_memory(block) };
///
/// pool.detach_from_thread();
/// ```
///
/// A pool cannot be sent or shared across threads:
///
/// ```rust,compile_fail
/// fn require_send<T: Send>() {}
/// require_send::<tlpool::Pool>();
/// ```
///
/// ```rust,compile_fail
/// fn require_sync<T: Sync>() {}
/// require_sync::<tlpool::Pool>();
/// ```
///
/// ```rust,compile_fail
/// let mut pool = tlpool::Pool::create();
/// std::thread::spawn(move || pool.attach_to_thread());
/// ```
pub struct Pool {
    id: PoolId,
    arena: NonNull<MemoryPool>,
}

impl Pool {
    /// Create a pool with the default 64 KB head chunk and 32 KB growth chunks.
    pub fn create() -> Pool {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with explicit arena sizes.
    pub fn with_config(config: PoolConfig) -> Pool {
        let arena = Box::new(MemoryPool::make(config.prealloc_size, config.min_alloc_size));
        let pool = Pool {
            id: PoolId::next(),
            arena: NonNull::from(Box::leak(arena)),
        };
        pool_trace!("CREATE {}", pool.id);
        pool
    }

    /// Whether any pool is attached to the calling thread.
    pub fn is_attached() -> bool {
        tls::current().is_some()
    }

    /// This pool's id.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Whether this pool is the one attached to the calling thread.
    pub fn is_attached_here(&self) -> bool {
        tls::attached_id() == Some(self.id)
    }

    /// Make this pool serve allocations on the calling thread.
    ///
    /// The thread must not have a pool attached already. If it does, `TP001`
    /// is reported and the current attachment is left in place.
    pub fn attach_to_thread(&mut self) {
        if tls::current().is_some() {
            tp_emit!(TP001, "{}", DiagContext::capture(Some(self.id)));
            return;
        }

        pool_trace!("ATTACH {}", self.id);
        tls::replace(Some(Attachment {
            id: self.id,
            arena: self.arena,
        }));
    }

    /// Stop serving allocations on the calling thread.
    ///
    /// This pool must be the one attached to the calling thread. If it is
    /// not, `TP002` is reported and nothing changes. Detaching hands the
    /// arena's scratch chunk back to the system.
    pub fn detach_from_thread(&mut self) {
        if !self.is_attached_here() {
            tp_emit!(TP002, "{}", DiagContext::capture(Some(self.id)));
            return;
        }

        pool_trace!("DETACH {}", self.id);
        self.arena_mut().reset_scratch_space();
        tls::replace(None);
    }

    /// Attach for the lifetime of the returned guard.
    pub fn attach(&mut self) -> AttachGuard<'_> {
        AttachGuard::new(self)
    }

    /// Current arena statistics.
    pub fn stats(&self) -> PoolStats {
        self.arena().stats()
    }

    /// True iff every block allocated from this pool has been freed.
    pub fn is_empty(&self) -> bool {
        self.arena().is_empty()
    }

    /// Blocks allocated from this pool and not yet freed.
    pub fn leak_report(&self) -> LeakReport {
        self.arena().report_leaks()
    }

    fn arena(&self) -> &MemoryPool {
        // SAFETY: the arena lives until `drop`; the router only borrows it
        // for the duration of a call, never across one of ours
        unsafe { self.arena.as_ref() }
    }

    fn arena_mut(&mut self) -> &mut MemoryPool {
        // SAFETY: as above
        unsafe { self.arena.as_mut() }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("attached_here", &self.is_attached_here())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        let still_attached = self.is_attached_here();
        let attached_ctx = still_attached.then(|| DiagContext::capture(Some(self.id)));
        if still_attached {
            tls::replace(None);
        }

        // SAFETY: the slot no longer references the arena, and the pointer
        // came from `Box::leak` in `with_config`
        let arena = unsafe { Box::from_raw(self.arena.as_ptr()) };
        let leaks = arena.report_leaks();
        let empty = arena.is_empty();
        drop(arena);

        pool_trace!("DELETE {}", self.id);

        if let Some(ctx) = attached_ctx {
            tp_emit!(TP101, "{}", ctx);
        }
        if !empty {
            tp_emit!(TP102, "{} {}", DiagContext::capture(Some(self.id)), leaks);
        }
    }
}
