//! Diagnostic emission backend.
//!
//! Handles outputting diagnostics to stderr, the log crate, or a sink
//! captured on the current thread, then applies the strict mode.

use std::cell::RefCell;
use std::sync::Arc;

use super::kind::Diagnostic;
use super::strict::should_panic;
use crate::sync::mutex::Mutex;

thread_local! {
    static SINK: RefCell<Option<Arc<dyn DiagnosticSink>>> = const { RefCell::new(None) };
}

/// Emit a diagnostic.
pub fn emit(diag: &Diagnostic) {
    dispatch(diag, None);
}

/// Emit a diagnostic with additional runtime context.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    dispatch(diag, Some(context));
}

fn dispatch(diag: &Diagnostic, context: Option<&str>) {
    let captured = SINK
        .try_with(|slot| slot.borrow().clone())
        .ok()
        .flatten();

    match captured {
        Some(sink) => sink.emit(diag, context),
        None => {
            // Stderr output only in checked builds
            #[cfg(any(debug_assertions, feature = "diagnostics"))]
            emit_to_stderr(diag, context);
        }
    }

    #[cfg(feature = "log")]
    emit_to_log(diag, context);

    // Never turn an unwind into an abort
    if should_panic() && !std::thread::panicking() {
        match context {
            Some(context) => panic!(
                "[tlpool][{}] {}\nContext: {}\nStrict mode enabled - errors are fatal.",
                diag.code, diag.message, context
            ),
            None => panic!(
                "[tlpool][{}] {}\nStrict mode enabled - errors are fatal.",
                diag.code, diag.message
            ),
        }
    }
}

/// Internal: emit to stderr.
#[cfg(any(debug_assertions, feature = "diagnostics"))]
fn emit_to_stderr(diag: &Diagnostic, context: Option<&str>) {
    use std::io::Write;

    let mut stderr = std::io::stderr().lock();

    let _ = writeln!(
        stderr,
        "[tlpool][{}] error: {}",
        diag.code,
        diag.message
    );

    if let Some(context) = context {
        let _ = writeln!(stderr, "  context: {}", context);
    }
    if let Some(note) = diag.note {
        let _ = writeln!(stderr, "  note: {}", note);
    }
    if let Some(help) = diag.help {
        let _ = writeln!(stderr, "  help: {}", help);
    }

    let _ = writeln!(stderr);
}

/// Emit a diagnostic using the log crate.
#[cfg(feature = "log")]
fn emit_to_log(diag: &Diagnostic, context: Option<&str>) {
    let context = context.unwrap_or("-");
    log::error!(target: "tlpool", "[{}] {} ({})", diag.code, diag.message, context);

    if let Some(help) = diag.help {
        log::info!(target: "tlpool", "  help: {}", help);
    }
}

/// A diagnostic sink trait for custom output.
pub trait DiagnosticSink: Send + Sync {
    /// Handle a diagnostic.
    fn emit(&self, diag: &Diagnostic, context: Option<&str>);
}

/// Route diagnostics emitted on the current thread to `sink` instead of
/// stderr, until the returned guard is dropped.
pub fn capture(sink: Arc<dyn DiagnosticSink>) -> SinkGuard {
    let previous = SINK.with(|slot| slot.borrow_mut().replace(sink));
    SinkGuard { previous }
}

/// Restores the previously captured sink when dropped.
pub struct SinkGuard {
    previous: Option<Arc<dyn DiagnosticSink>>,
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = SINK.try_with(|slot| *slot.borrow_mut() = previous);
    }
}

/// A collected diagnostic together with its runtime context.
#[derive(Debug, Clone)]
pub struct Report {
    /// The diagnostic.
    pub diagnostic: Diagnostic,
    /// Context captured at emission time.
    pub context: Option<String>,
}

/// A simple sink that collects diagnostics.
#[derive(Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<Report>>,
}

impl CollectingSink {
    /// Create a new collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected reports.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.reports
            .lock()
            .iter()
            .map(|r| r.diagnostic.clone())
            .collect()
    }

    /// Codes of the collected diagnostics, in emission order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.reports.lock().iter().map(|r| r.diagnostic.code).collect()
    }

    /// Clear collected diagnostics.
    pub fn clear(&self) {
        self.reports.lock().clear();
    }

    /// True if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diag: &Diagnostic, context: Option<&str>) {
        self.reports.lock().push(Report {
            diagnostic: diag.clone(),
            context: context.map(str::to_owned),
        });
    }
}
