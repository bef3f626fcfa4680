//! Allocation backends.
//!
//! The per-pool arena and the system fallback, sharing one block header
//! format.

pub(crate) mod arena;
pub(crate) mod header;
pub(crate) mod system;
