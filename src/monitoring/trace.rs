//! Trace context propagated through a message's journey across actors.
//!
//! Grounded on the teacher's event-bus shape (`SupervisionEvent`/`ActorEvent`)
//! extended with span-per-turn correlation.

use std::collections::HashMap;

use chrono::{DateTime, Utc}; // §3.2 MANDATORY
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single logical request as it hops between actors, the worker
/// pool, and remote nodes (§3 "`TraceContext` — `{traceId, spanId,
/// parentSpanId, sampled, baggage}`").
///
/// A `TraceContext` is created once at the root of a causal chain (e.g. when
/// an external request enters the system) and carried along in
/// [`crate::message::MessageEnvelope`] via `correlation_id`-adjacent metadata.
/// Each hop records a [`TraceSpan`] under the same `trace_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// Identifies the whole causal chain.
    pub trace_id: Uuid,
    /// Identifies this specific hop/span within the chain.
    pub span_id: Uuid,
    /// The span that caused this one, if any.
    pub parent_span_id: Option<Uuid>,
    /// Whether this trace is sampled (recorded) or dropped.
    pub sampled: bool,
    /// Arbitrary key/value context propagated unchanged to every descendant
    /// span (e.g. a tenant id picked up at the root).
    pub baggage: HashMap<String, String>,
}

impl TraceContext {
    /// Start a new root trace, sampled according to `sample_rate` (0.0..=1.0).
    pub fn new_root(sample_rate: f64) -> Self {
        let sampled = sample_rate >= 1.0
            || (sample_rate > 0.0 && rand::random::<f64>() < sample_rate);
        Self {
            trace_id: Uuid::new_v4(),
            span_id: Uuid::new_v4(),
            parent_span_id: None,
            sampled,
            baggage: HashMap::new(),
        }
    }

    /// Derive a child span for the next hop, preserving `trace_id`, sampling
    /// decision, and baggage.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: Uuid::new_v4(),
            parent_span_id: Some(self.span_id),
            sampled: self.sampled,
            baggage: self.baggage.clone(),
        }
    }

    /// Attach a baggage entry, carried to every descendant span.
    #[must_use]
    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }
}

/// The role a span plays, following the OpenTelemetry span-kind vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    /// A message was received and is being processed (an actor's turn).
    Consumer,
    /// A message was sent (e.g. a transport `send`, a worker submission).
    Producer,
    /// Work with no external message boundary (e.g. a cluster sweep tick).
    Internal,
}

/// The outcome of a finished span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    /// Still running.
    Unset,
    /// Completed without error.
    Ok,
    /// Completed with an error, carrying its display message.
    Error(String),
}

/// A single recorded hop within a trace, emitted by instrumentation around
/// a cell's turn, a worker task, a transport send, or a cluster sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    /// The trace context this span belongs to.
    pub context: TraceContext,
    /// Human-readable name of the operation (e.g. "actor.turn", "worker.task").
    pub operation: String,
    /// The span's role.
    pub kind: SpanKind,
    /// When the span started.
    pub started_at: DateTime<Utc>,
    /// When the span ended, if it has.
    pub ended_at: Option<DateTime<Utc>>,
    /// Outcome; `Unset` until `finish`/`fail` is called.
    pub status: SpanStatus,
}

impl TraceSpan {
    /// Start a new span for `operation` under `context`.
    pub fn start(context: TraceContext, operation: impl Into<String>, kind: SpanKind) -> Self {
        Self {
            context,
            operation: operation.into(),
            kind,
            started_at: Utc::now(),
            ended_at: None,
            status: SpanStatus::Unset,
        }
    }

    /// Mark the span as finished successfully.
    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
        self.status = SpanStatus::Ok;
    }

    /// Mark the span as finished with an error.
    pub fn fail(&mut self, cause: impl Into<String>) {
        self.ended_at = Some(Utc::now());
        self.status = SpanStatus::Error(cause.into());
    }

    /// Duration of the span in milliseconds, if finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
