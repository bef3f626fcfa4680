//! Process-wide state: the per-thread attachment slot.

pub(crate) mod tls;
