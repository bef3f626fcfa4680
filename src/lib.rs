//! # tlpool
//!
//! Thread-attached memory pools for short-lived, allocation-heavy phases
//! such as building a compiler IR.
//!
//! ## Features
//!
//! - One pool attached per thread, switched explicitly or by guard
//! - A single allocation entry point ([`alloc_memory`] / [`free_memory`])
//!   routed to the attached pool or to the system allocator
//! - Chunked arena with top-of-stack rewind and scratch chunk reuse
//! - Teardown checks: destroyed-while-attached and leaked blocks
//! - Coded protocol diagnostics with a configurable strict mode
//! - Safe wrapper type ([`PoolBox`]) tied to the attachment's lifetime
//!
//! ## Quick Start
//!
//! ```rust
//! use tlpool::Pool;
//!
//! let mut pool = Pool::create();
//! {
//!     let guard = pool.attach();
//!     let node = guard.alloc_box((1u32, 2u32));
//!     assert_eq!(node.0 + node.1, 3);
//! }
//! assert!(pool.is_empty());
//! ```

pub mod api;
pub mod diagnostics;

mod allocators;
mod core;
mod sync;
mod util;

#[cfg(feature = "debug")]
mod debug;

// Re-export public API at crate root for convenience
pub use api::config::{PoolConfig, DEFAULT_MIN_ALLOC_SIZE, DEFAULT_PREALLOC_SIZE};
pub use api::pool::{Pool, PoolId};
pub use api::router::{alloc_memory, fallback_stats, free_memory};
pub use api::scope::AttachGuard;
pub use api::stats::{FallbackStats, LeakReport, LeakedBlock, PoolStats};
pub use api::wrappers::PoolBox;

// Diagnostics - core types and predefined codes
pub use diagnostics::Diagnostic;
pub use diagnostics::{set_strict_mode, StrictMode, StrictModeGuard};
pub use diagnostics::{TP001, TP002, TP101, TP102, TP201};
