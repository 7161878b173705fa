//! Structured logging (tracing) and JSON-lines output.

mod format;

pub use format::StructuredLogger;
