//! Public API for tlpool.
//!
//! This module contains all user-facing types and functions.

pub mod config;
pub mod pool;
pub mod router;
pub mod scope;
pub mod stats;
pub mod wrappers;
