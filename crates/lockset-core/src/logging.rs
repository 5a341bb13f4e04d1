//! Injectable logging for lock events.
//!
//! Locks report every acquire/release outcome at debug level through a
//! [`LockLogger`]. Messages are templates with `{placeholder}` markers and a
//! [`LogContext`] holding the values. Per-file events use exactly the keys
//! `desc` and `file`; group events use `desc` only and carry their counts in
//! the message itself.

use std::{collections::BTreeMap, fmt, sync::Arc};

/// Placeholder values for a log message template.
pub type LogContext = BTreeMap<&'static str, String>;

/// Receiver for lock diagnostics.
pub trait LockLogger: fmt::Debug + Send + Sync {
    fn debug(&self, message: &str, context: &LogContext);
}

/// Default logger: forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl LockLogger for TracingLogger {
    fn debug(&self, message: &str, context: &LogContext) {
        let desc = context.get("desc").map_or("", String::as_str);
        let file = context.get("file").map_or("", String::as_str);
        tracing::debug!(desc, file, "{}", interpolate(message, context));
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl LockLogger for NullLogger {
    fn debug(&self, _message: &str, _context: &LogContext) {}
}

/// Shared logger handle used by locks and groups.
pub(crate) type SharedLogger = Arc<dyn LockLogger>;

pub(crate) fn default_logger() -> SharedLogger {
    Arc::new(TracingLogger)
}

/// Replace `{key}` markers with context values. Unknown markers are left as-is.
#[must_use]
pub fn interpolate(message: &str, context: &LogContext) -> String {
    context
        .iter()
        .fold(message.to_string(), |rendered, (key, value)| {
            rendered.replace(&format!("{{{key}}}"), value)
        })
}
