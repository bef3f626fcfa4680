//! Safe wrapper types for pool allocations.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::allocators::header::ALIGNMENT;
use crate::api::router::{alloc_memory, free_memory};
use crate::api::scope::AttachGuard;

/// A Box-like owner of a value stored in an attached pool.
///
/// Borrowed from the [`AttachGuard`] that keeps the pool attached, so it
/// cannot outlive the attachment and is always freed into the pool it came
/// from. Like the pool itself, it stays on the creating thread.
///
/// # Example
///
/// ```rust
/// use tlpool::Pool;
///
/// let mut pool = Pool::create();
/// let guard = pool.attach();
///
/// let mut names = guard.alloc_box(Vec::<&str>::new());
/// names.push("add");
/// assert_eq!(names.len(), 1);
/// ```
///
/// Boxes stay on the thread whose pool holds them:
///
/// ```rust,compile_fail
/// fn require_send<T: Send>() {}
/// require_send::<tlpool::PoolBox<'static, u8>>();
/// ```
///
/// ```rust,compile_fail
/// let mut pool = tlpool::Pool::create();
/// let guard = pool.attach();
/// let value = guard.alloc_box(7u8);
/// std::thread::scope(|s| {
///     s.spawn(move || drop(value));
/// });
/// ```
pub struct PoolBox<'g, T> {
    ptr: NonNull<T>,
    _marker: PhantomData<(&'g AttachGuard<'g>, T)>,
}

impl<'g, T> PoolBox<'g, T> {
    pub(crate) fn new_in(guard: &'g AttachGuard<'_>, value: T) -> Self {
        assert!(
            guard.is_active(),
            "PoolBox requires an active attach guard for {}",
            guard.pool().id()
        );
        assert!(
            mem::align_of::<T>() <= ALIGNMENT,
            "PoolBox cannot hold a type aligned to {} bytes",
            mem::align_of::<T>()
        );

        let ptr = alloc_memory(mem::size_of::<T>()).cast::<T>();
        // SAFETY: fresh block of at least size_of::<T>() bytes, aligned to 16
        unsafe { ptr.as_ptr().write(value) };

        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Get the raw pointer.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Get the raw mutable pointer.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Move the value out and free its block.
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: the value is initialized and read exactly once; the block
        // is freed under the guard's attachment
        unsafe {
            let value = ptr::read(this.ptr.as_ptr());
            free_memory(this.ptr.cast());
            value
        }
    }
}

impl<T> Deref for PoolBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for PoolBox<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for PoolBox<'_, T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            free_memory(self.ptr.cast());
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PoolBox<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::pool::Pool;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<u32>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_drop_runs_destructor_and_frees() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = Pool::create();
        {
            let guard = pool.attach();
            let boxed = guard.alloc_box(Counted(drops.clone()));
            assert_eq!(guard.pool().stats().live_blocks, 1);
            drop(boxed);
            assert_eq!(drops.get(), 1);
            assert!(guard.pool().is_empty());
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn test_into_inner_moves_value_out() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = Pool::create();
        let guard = pool.attach();

        let boxed = guard.alloc_box(Counted(drops.clone()));
        let value = boxed.into_inner();
        assert_eq!(drops.get(), 0);
        assert!(guard.pool().is_empty());

        drop(value);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_deref_mut_and_alignment() {
        #[repr(align(16))]
        struct Aligned([u8; 16]);

        let mut pool = Pool::create();
        let guard = pool.attach();

        let mut boxed = guard.alloc_box(Aligned([0; 16]));
        boxed.0[3] = 7;
        assert_eq!(boxed.0[3], 7);
        assert_eq!(boxed.as_ptr() as usize % 16, 0);
    }

    #[test]
    #[should_panic(expected = "cannot hold a type aligned to 32 bytes")]
    fn test_over_aligned_type_is_refused() {
        #[repr(align(32))]
        struct Wide(#[allow(dead_code)] u8);

        let mut pool = Pool::create();
        let guard = pool.attach();
        let _boxed = guard.alloc_box(Wide(1));
    }

    #[test]
    #[should_panic(expected = "requires an active attach guard")]
    fn test_inactive_guard_is_refused() {
        let _strict = crate::diagnostics::strict::StrictModeGuard::warn();
        let _capture = crate::diagnostics::capture(std::sync::Arc::new(
            crate::diagnostics::CollectingSink::new(),
        ));

        let mut outer = Pool::create();
        let mut inner = Pool::create();
        let _outer = outer.attach();
        let guard = inner.attach();
        let _boxed = guard.alloc_box(1u8);
    }
}
