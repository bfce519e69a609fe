//! Structured logging records correlated with trace spans.
//!
//! Grounded on [`super::types::SupervisionEvent`]'s free-form `metadata` map
//! shape, extended with structured log record fields and a pluggable sink.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use super::error::MonitoringError;
use super::traits::EventSeverity;

/// A single structured log line, optionally correlated to a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
    /// Severity, reusing [`EventSeverity`] rather than a parallel level enum.
    pub level: EventSeverity,
    /// The trace this record belongs to, if any.
    pub trace_id: Option<Uuid>,
    /// Where the record came from (e.g. an actor address, "worker.pool").
    pub context: String,
    /// The human-readable message.
    pub msg: String,
    /// Arbitrary structured key/value pairs.
    pub attributes: HashMap<String, String>,
}

impl LogRecord {
    /// Creates a new record with no trace correlation and no attributes.
    pub fn new(level: EventSeverity, context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            trace_id: None,
            context: context.into(),
            msg: msg.into(),
            attributes: HashMap::new(),
        }
    }

    /// Correlates this record with a trace.
    #[must_use]
    pub fn with_trace(mut self, trace_id: Uuid) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attaches a structured attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Destination for structured log records.
///
/// Kept as a trait object for the same reason as
/// [`super::exporter::SpanExporter`]: the sink is chosen once at boot and
/// held for the process lifetime.
#[async_trait]
pub trait LogSink: Send + Sync + 'static {
    /// Writes a single record.
    ///
    /// # Errors
    /// Returns [`MonitoringError`] if the record could not be written.
    async fn write(&self, record: LogRecord) -> Result<(), MonitoringError>;
}

/// Writes records to stdout/stderr via `tracing`, preserving `level`.
#[derive(Debug, Default)]
pub struct ConsoleLogSink;

#[async_trait]
impl LogSink for ConsoleLogSink {
    async fn write(&self, record: LogRecord) -> Result<(), MonitoringError> {
        let trace_id = record.trace_id.map(|id| id.to_string()).unwrap_or_default();
        match record.level {
            EventSeverity::Trace => {
                trace!(trace_id, context = %record.context, attributes = ?record.attributes, "{}", record.msg);
            }
            EventSeverity::Debug => {
                debug!(trace_id, context = %record.context, attributes = ?record.attributes, "{}", record.msg);
            }
            EventSeverity::Info => {
                info!(trace_id, context = %record.context, attributes = ?record.attributes, "{}", record.msg);
            }
            EventSeverity::Warning => {
                warn!(trace_id, context = %record.context, attributes = ?record.attributes, "{}", record.msg);
            }
            EventSeverity::Error | EventSeverity::Critical => {
                error!(trace_id, context = %record.context, attributes = ?record.attributes, "{}", record.msg);
            }
        }
        Ok(())
    }
}
