//! Protocol-violation diagnostics.
//!
//! Every misuse of the attachment protocol is reported as a coded
//! [`Diagnostic`]. What happens next depends on the [`StrictMode`]:
//! checked builds (`debug_assertions` or the `diagnostics` feature) default to
//! panicking on errors, unchecked builds default to reporting nothing.
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                        |
//! |-------|--------------------------------|
//! | TP0xx | Attachment protocol            |
//! | TP1xx | Pool teardown                  |
//! | TP2xx | Allocation routing             |
//!
//! ## Capturing diagnostics
//!
//! ```rust
//! use std::sync::Arc;
//! use tlpool::diagnostics::{capture, CollectingSink, StrictMode, StrictModeGuard};
//! use tlpool::Pool;
//!
//! let _strict = StrictModeGuard::new(StrictMode::Warn);
//! let sink = Arc::new(CollectingSink::new());
//! let _capture = capture(sink.clone());
//!
//! let mut pool = Pool::create();
//! pool.detach_from_thread(); // never attached
//!
//! assert_eq!(sink.codes(), vec!["TP002"]);
//! ```

pub mod context;
pub mod emit;
pub mod kind;
pub(crate) mod macros;
pub mod strict;

pub use context::DiagContext;
pub use emit::{capture, emit, emit_with_context, CollectingSink, DiagnosticSink, Report, SinkGuard};
pub use kind::Diagnostic;
pub use strict::{init_from_env, set_strict_mode, strict_mode, StrictMode, StrictModeGuard};

pub use kind::{TP001, TP002, TP101, TP102, TP201};
