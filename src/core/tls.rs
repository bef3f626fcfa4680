//! Thread-local attachment slot.
//!
//! Each thread owns one slot holding at most one [`Attachment`]: the id of
//! the attached pool and a non-owning pointer to its arena. The slot starts
//! empty, is only written by attach/detach and pool teardown, and needs no
//! destructor, so it stays readable until the thread is gone.

use std::cell::Cell;
use std::ptr::NonNull;

use crate::allocators::arena::MemoryPool;
use crate::api::pool::PoolId;

/// What the slot holds while a pool is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Attachment {
    /// Id of the attached pool
    pub id: PoolId,

    /// Arena owned by that pool
    pub arena: NonNull<MemoryPool>,
}

thread_local! {
    static SLOT: Cell<Option<Attachment>> = const { Cell::new(None) };
}

/// The calling thread's current attachment.
#[inline]
pub(crate) fn current() -> Option<Attachment> {
    SLOT.with(Cell::get)
}

/// Id of the pool attached to the calling thread.
#[inline]
pub(crate) fn attached_id() -> Option<PoolId> {
    current().map(|a| a.id)
}

/// Store `next` in the slot, returning what it held.
#[inline]
pub(crate) fn replace(next: Option<Attachment>) -> Option<Attachment> {
    SLOT.with(|slot| slot.replace(next))
}

/// Run `f` against the attached arena, or return `None` if the slot is empty.
#[inline]
pub(crate) fn with_attached<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut MemoryPool, PoolId) -> R,
{
    let attachment = current()?;

    // SAFETY: the slot only ever references arenas of live pools. A pool is
    // !Send, so it is dropped on the thread it was attached on, and its
    // destructor clears this slot before freeing the arena. Arena methods
    // never call back into the router, so this is the only live borrow.
    let arena = unsafe { &mut *attachment.arena.as_ptr() };
    Some(f(arena, attachment.id))
}
