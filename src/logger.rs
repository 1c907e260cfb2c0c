//! Pluggable logging for the client.
//!
//! The pipeline never talks to a logging backend directly. It reports through
//! a [`Logger`], which defaults to [`NoopLogger`]. Use [`TracingLogger`] to
//! route messages into the `tracing` ecosystem.

use serde_json::{Map, Value};

/// Structured key-value fields attached to a log message.
pub type LogFields = Map<String, Value>;

/// Logging capability consumed by the client.
pub trait Logger: Send + Sync {
    /// Log a debug message.
    fn debug(&self, msg: &str, fields: Option<&LogFields>);

    /// Log an informational message.
    fn info(&self, msg: &str, fields: Option<&LogFields>);

    /// Log a warning.
    fn warn(&self, msg: &str, fields: Option<&LogFields>);

    /// Log an error.
    fn error(&self, msg: &str, fields: Option<&LogFields>);
}

/// Logger that discards everything. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _msg: &str, _fields: Option<&LogFields>) {}
    fn info(&self, _msg: &str, _fields: Option<&LogFields>) {}
    fn warn(&self, _msg: &str, _fields: Option<&LogFields>) {}
    fn error(&self, _msg: &str, _fields: Option<&LogFields>) {}
}

/// Logger that forwards to the `tracing` macros under the `refyne` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

fn render(fields: Option<&LogFields>) -> String {
    match fields {
        Some(f) if !f.is_empty() => Value::Object(f.clone()).to_string(),
        _ => String::new(),
    }
}

impl Logger for TracingLogger {
    fn debug(&self, msg: &str, fields: Option<&LogFields>) {
        tracing::debug!(target: "refyne", fields = %render(fields), "{}", msg);
    }

    fn info(&self, msg: &str, fields: Option<&LogFields>) {
        tracing::info!(target: "refyne", fields = %render(fields), "{}", msg);
    }

    fn warn(&self, msg: &str, fields: Option<&LogFields>) {
        tracing::warn!(target: "refyne", fields = %render(fields), "{}", msg);
    }

    fn error(&self, msg: &str, fields: Option<&LogFields>) {
        tracing::error!(target: "refyne", fields = %render(fields), "{}", msg);
    }
}

/// Build [`LogFields`] from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works.
macro_rules! log_fields {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut fields = $crate::logger::LogFields::new();
        $(fields.insert($key.to_string(), serde_json::json!($value));)*
        fields
    }};
}

pub(crate) use log_fields;
