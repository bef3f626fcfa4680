//! Internal reporting macros.

/// Report a predefined diagnostic, optionally with a formatted context.
///
/// ```rust,ignore
/// tp_emit!(TP001);
/// tp_emit!(TP102, "{} {}", ctx, report);
/// ```
macro_rules! tp_emit {
    ($code:ident) => {
        $crate::diagnostics::emit::emit(&$crate::diagnostics::kind::$code)
    };
    ($code:ident, $($ctx:tt)+) => {
        $crate::diagnostics::emit::emit_with_context(
            &$crate::diagnostics::kind::$code,
            &format!($($ctx)+),
        )
    };
}

/// Trace pool lifecycle and routing through the log crate.
///
/// Compiles to nothing without the `log` feature.
macro_rules! pool_trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        {
            log::trace!(target: "tlpool", $($arg)+);
        }
        #[cfg(not(feature = "log"))]
        {
            let _ = format_args!($($arg)+);
        }
    }};
}

pub(crate) use pool_trace;
pub(crate) use tp_emit;
