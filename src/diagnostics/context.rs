//! Diagnostic context - thread and attachment state at the time of a report.

use std::thread::ThreadId;

use crate::api::pool::PoolId;
use crate::core::tls;

/// Diagnostic context containing runtime state.
#[derive(Debug, Clone)]
pub struct DiagContext {
    /// Current thread ID.
    pub thread_id: ThreadId,
    /// Thread name (if available).
    pub thread_name: Option<String>,
    /// Pool the reported operation was invoked on.
    pub pool: Option<PoolId>,
    /// Pool attached to the thread when the report was made.
    pub attached: Option<PoolId>,
}

impl DiagContext {
    /// Capture the current context for an operation on `pool`.
    pub fn capture(pool: Option<PoolId>) -> Self {
        let thread = std::thread::current();
        Self {
            thread_id: thread.id(),
            thread_name: thread.name().map(String::from),
            pool,
            attached: tls::attached_id(),
        }
    }

    /// Format context for diagnostic output.
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(ref name) = self.thread_name {
            parts.push(format!("thread=\"{}\"", name));
        } else {
            parts.push(format!("thread={:?}", self.thread_id));
        }

        if let Some(pool) = self.pool {
            parts.push(format!("pool={}", pool));
        }

        match self.attached {
            Some(attached) => parts.push(format!("attached={}", attached)),
            None => parts.push("attached=none".to_string()),
        }

        parts.join(" ")
    }
}

impl std::fmt::Display for DiagContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_format() {
        std::thread::Builder::new()
            .name("ir-builder".into())
            .spawn(|| {
                let pool = PoolId::next();
                let ctx = DiagContext::capture(Some(pool));
                assert_eq!(ctx.attached, None);
                assert_eq!(
                    ctx.format(),
                    format!("thread=\"ir-builder\" pool={} attached=none", pool)
                );
            })
            .unwrap()
            .join()
            .unwrap();
    }
}
