//! Allocation backtrace tracking.
//!
//! Records where each live arena block was allocated so teardown leak
//! reports can point at the code that leaked. An arena belongs to one
//! thread, so no locking is needed.

use std::collections::HashMap;

/// Backtraces of live blocks, keyed by payload address.
#[derive(Default)]
pub struct AllocationTraces {
    traces: HashMap<usize, String>,
}

impl AllocationTraces {
    /// Record the allocation of the block at `address`.
    pub fn record(&mut self, address: usize) {
        let bt = backtrace::Backtrace::new();
        self.traces.insert(address, format!("{:?}", bt));
    }

    /// Drop the record of a released block.
    pub fn forget(&mut self, address: usize) {
        self.traces.remove(&address);
    }

    /// Get the trace for an address (if tracked).
    pub fn get(&self, address: usize) -> Option<String> {
        self.traces.get(&address).cloned()
    }

    /// Number of blocks with a recorded trace.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.traces.len()
    }
}
