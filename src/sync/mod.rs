//! Synchronization primitives.
//!
//! Only diagnostic sinks need a lock; the allocation paths are lock-free by
//! being thread-local.

pub(crate) mod mutex;
