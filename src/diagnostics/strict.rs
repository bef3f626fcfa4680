//! Strict mode handling for diagnostics.
//!
//! Decides what a reported violation does:
//! - Warn: just report it
//! - PanicOnError: report, then panic (the default in checked builds)
//!
//! The process-wide mode can be overridden per thread with a
//! [`StrictModeGuard`], which keeps tests running in parallel independent.

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};

/// Strict mode behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StrictMode {
    /// Just report, don't panic.
    Warn = 0,
    /// Panic on every violation.
    PanicOnError = 1,
}

impl StrictMode {
    /// Mode used until something else is configured.
    pub const fn build_default() -> Self {
        if cfg!(any(debug_assertions, feature = "diagnostics")) {
            StrictMode::PanicOnError
        } else {
            StrictMode::Warn
        }
    }

    fn from_raw(val: u8) -> Option<Self> {
        match val {
            0 => Some(StrictMode::Warn),
            1 => Some(StrictMode::PanicOnError),
            _ => None,
        }
    }
}

const UNSET: u8 = u8::MAX;

/// Process-wide strict mode.
static STRICT_MODE: AtomicU8 = AtomicU8::new(UNSET);

thread_local! {
    static THREAD_OVERRIDE: Cell<Option<StrictMode>> = const { Cell::new(None) };
}

/// Set the process-wide strict mode.
pub fn set_strict_mode(mode: StrictMode) {
    STRICT_MODE.store(mode as u8, Ordering::Relaxed);
}

/// Get the strict mode in effect on the calling thread.
pub fn strict_mode() -> StrictMode {
    let local = THREAD_OVERRIDE.try_with(Cell::get).ok().flatten();
    local
        .or_else(|| StrictMode::from_raw(STRICT_MODE.load(Ordering::Relaxed)))
        .unwrap_or(StrictMode::build_default())
}

/// Check if a reported violation should panic.
pub fn should_panic() -> bool {
    strict_mode() == StrictMode::PanicOnError
}

/// RAII guard for temporarily setting strict mode on the current thread.
pub struct StrictModeGuard {
    previous: Option<StrictMode>,
}

impl StrictModeGuard {
    /// Create a new guard that sets strict mode.
    pub fn new(mode: StrictMode) -> Self {
        let previous = THREAD_OVERRIDE.with(|cell| cell.replace(Some(mode)));
        Self { previous }
    }

    /// Create a guard that enables panic-on-error.
    pub fn panic_on_error() -> Self {
        Self::new(StrictMode::PanicOnError)
    }

    /// Create a guard that only reports.
    pub fn warn() -> Self {
        Self::new(StrictMode::Warn)
    }
}

impl Drop for StrictModeGuard {
    fn drop(&mut self) {
        let _ = THREAD_OVERRIDE.try_with(|cell| cell.set(self.previous));
    }
}

/// Parse a `TLPOOL_STRICT` value.
fn parse_mode(val: &str) -> StrictMode {
    match val.to_lowercase().as_str() {
        "1" | "error" | "panic" | "true" => StrictMode::PanicOnError,
        _ => StrictMode::Warn,
    }
}

/// Initialize strict mode from environment variable.
///
/// Checks `TLPOOL_STRICT`:
/// - "0" or "warn" -> Warn
/// - "1", "error" or "panic" -> PanicOnError
pub fn init_from_env() {
    if let Ok(val) = std::env::var("TLPOOL_STRICT") {
        set_strict_mode(parse_mode(&val));
    }
}
