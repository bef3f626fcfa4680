//! Scoped attachment guards.

use crate::api::pool::Pool;
use crate::api::wrappers::PoolBox;

/// Keeps a pool attached to the calling thread until dropped.
///
/// Created by [`Pool::attach`]. If the thread already had a pool attached,
/// the attach is rejected (`TP001`) and the guard is inactive: dropping it
/// does not detach anything and [`alloc_box`](Self::alloc_box) refuses to
/// allocate.
///
/// # Example
///
/// ```rust
/// use tlpool::Pool;
///
/// let mut pool = Pool::create();
/// {
///     let guard = pool.attach();
///     let value = guard.alloc_box([0u32; 16]);
///     assert_eq!(value.len(), 16);
/// }
/// assert!(!Pool::is_attached());
/// ```
///
/// The guard cannot carry the attachment to another thread:
///
/// ```rust,compile_fail
/// fn require_send<T: Send>() {}
/// require_send::<tlpool::AttachGuard<'static>>();
/// ```
pub struct AttachGuard<'p> {
    pool: &'p mut Pool,
    attached: bool,
}

impl<'p> AttachGuard<'p> {
    pub(crate) fn new(pool: &'p mut Pool) -> Self {
        pool.attach_to_thread();
        let attached = pool.is_attached_here();
        Self { pool, attached }
    }

    /// The attached pool.
    pub fn pool(&self) -> &Pool {
        self.pool
    }

    /// Whether this guard's attach took effect.
    pub fn is_active(&self) -> bool {
        self.attached
    }

    /// Move `value` into the attached pool.
    ///
    /// # Panics
    ///
    /// Panics if the guard is inactive, or if `T` needs more than 16-byte
    /// alignment.
    pub fn alloc_box<T>(&self, value: T) -> PoolBox<'_, T> {
        PoolBox::new_in(self, value)
    }
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        if self.attached {
            self.pool.detach_from_thread();
        }
    }
}

impl std::fmt::Debug for AttachGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachGuard")
            .field("pool", &self.pool.id())
            .field("attached", &self.attached)
            .finish()
    }
}
