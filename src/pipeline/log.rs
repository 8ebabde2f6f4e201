//! Nested progress logging
//!
//! Progress messages are indented by the depth of the task that emits them,
//! so dependent computations read as a tree:
//!
//! ```text
//! Generating mappings 2026.01.01-1.12
//!   Extracting mapping archive
//!     Locating source
//! ```
//!
//! The depth is carried explicitly by a [`LogContext`] passed down the call
//! chain. [`LogContext::push`] returns a [`LogScope`] guard that restores the
//! previous depth when dropped, so an error returned with `?` can never leave
//! the indentation unbalanced.

use std::cell::Cell;

use tracing::{debug, info};

const INDENT: &str = "  ";

/// Depth-tracking log handle for one `process` invocation
#[derive(Debug, Default)]
pub struct LogContext {
    depth: Cell<usize>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    fn indent(&self) -> String {
        INDENT.repeat(self.depth())
    }

    /// Logs a progress message at the current depth
    pub fn info(&self, message: &str) {
        info!(depth = self.depth(), "{}{}", self.indent(), message);
    }

    /// Logs a diagnostic message at the current depth
    pub fn debug(&self, message: &str) {
        debug!(depth = self.depth(), "{}{}", self.indent(), message);
    }

    /// Enters a nested scope; the depth is restored when the guard drops
    #[must_use = "the scope ends as soon as the guard is dropped"]
    pub fn push(&self) -> LogScope<'_> {
        let restore = self.depth.get();
        self.depth.set(restore + 1);
        LogScope { cx: self, restore }
    }
}

/// Guard for one nested logging scope
#[derive(Debug)]
pub struct LogScope<'a> {
    cx: &'a LogContext,
    restore: usize,
}

impl Drop for LogScope<'_> {
    fn drop(&mut self) {
        self.cx.depth.set(self.restore);
    }
}
