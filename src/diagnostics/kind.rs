//! Diagnostic type and the predefined protocol diagnostics.

/// A protocol violation with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `TP0xx` - Attachment protocol
/// - `TP1xx` - Pool teardown
/// - `TP2xx` - Allocation routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Diagnostic code (e.g., "TP001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub const fn new(code: &'static str, message: &'static str) -> Self {
        Self {
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Attachment protocol (TP0xx)
// =============================================================================

/// TP001: Pool attached to a thread that already holds one.
pub const TP001: Diagnostic = Diagnostic::new(
    "TP001",
    "pool attached to a thread that already has a pool attached"
).with_note("a thread holds at most one pool; the attach was rejected and the current pool stays attached")
 .with_help("detach the current pool first, or scope attachments with Pool::attach()");

/// TP002: Detach of a pool that is not the thread's current pool.
pub const TP002: Diagnostic = Diagnostic::new(
    "TP002",
    "detached a pool that is not attached to this thread"
).with_note("the thread has no pool attached, or a different pool is attached; nothing was detached")
 .with_help("detach on the same thread that attached, and pair every attach with one detach");

// =============================================================================
// Teardown (TP1xx)
// =============================================================================

/// TP101: Pool destroyed while still attached.
pub const TP101: Diagnostic = Diagnostic::new(
    "TP101",
    "pool destroyed while still attached to this thread"
).with_note("the attachment was cleared so later allocations fall back to the system allocator")
 .with_help("call detach_from_thread() before dropping the pool");

/// TP102: Pool destroyed with outstanding allocations.
pub const TP102: Diagnostic = Diagnostic::new(
    "TP102",
    "pool destroyed with outstanding allocations"
).with_note("every block allocated while the pool was attached must be freed before it is dropped")
 .with_help("free the listed blocks with free_memory() while the pool is still attached");

// =============================================================================
// Routing (TP2xx)
// =============================================================================

/// TP201: Block freed through the wrong allocator.
pub const TP201: Diagnostic = Diagnostic::new(
    "TP201",
    "block freed through the wrong allocator"
).with_note("the block was not allocated under the current attachment, or was already released into this pool; it has been leaked instead")
 .with_help("free each block while the same pool (or no pool) is attached as when it was allocated");
