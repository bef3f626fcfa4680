//! Small helpers shared by the allocators and the public API.

pub(crate) mod layout;
pub(crate) mod size;
