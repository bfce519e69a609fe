//! Pluggable export of finished trace spans.
//!
//! Grounded on [`super::traits::Monitor`]'s own pluggability (in-memory vs.
//! no-op) extended to spans: a [`SpanCollector`] accumulates finished spans,
//! and a periodic flusher drains them through a [`SpanExporter`], following
//! [`crate::supervisor::health_monitor`]'s shutdown-channel task pattern.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use super::error::MonitoringError;
use super::trace::TraceSpan;

/// Destination for finished spans.
///
/// Kept as a trait object (`Arc<dyn SpanExporter>`) rather than a generic
/// parameter: the exporter is chosen once at system boot (console, OTLP,
/// ...) and stored for the life of the flusher, the same runtime-swappable
/// shape as [`crate::transport::Transport`].
#[async_trait]
pub trait SpanExporter: Send + Sync + 'static {
    /// Export a batch of finished spans.
    ///
    /// # Errors
    /// Returns [`MonitoringError`] if the batch could not be delivered.
    async fn export(&self, spans: Vec<TraceSpan>) -> Result<(), MonitoringError>;
}

/// Writes finished spans to stdout via `tracing`.
#[derive(Debug, Default)]
pub struct ConsoleSpanExporter;

#[async_trait]
impl SpanExporter for ConsoleSpanExporter {
    async fn export(&self, spans: Vec<TraceSpan>) -> Result<(), MonitoringError> {
        for span in &spans {
            info!(
                trace_id = %span.context.trace_id,
                span_id = %span.context.span_id,
                parent_span_id = ?span.context.parent_span_id,
                operation = %span.operation,
                kind = ?span.kind,
                status = ?span.status,
                duration_ms = span.duration_ms(),
                "span finished"
            );
        }
        Ok(())
    }
}

/// In-memory buffer of finished spans awaiting export.
///
/// Spans are pushed from wherever a turn/task/send completes and drained by
/// [`spawn_flusher`]'s periodic tick.
#[derive(Debug, Default, Clone)]
pub struct SpanCollector {
    spans: Arc<Mutex<Vec<TraceSpan>>>,
}

impl SpanCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished span for the next flush.
    pub fn push(&self, span: TraceSpan) {
        self.spans.lock().push(span);
    }

    /// Number of spans currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.lock().len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.lock().is_empty()
    }

    /// Takes every buffered span, leaving the collector empty.
    fn drain(&self) -> Vec<TraceSpan> {
        std::mem::take(&mut self.spans.lock())
    }
}

/// Spawns a background task that drains `collector` into `exporter` every
/// `flush_interval`, and once more on shutdown to avoid losing the final
/// batch.
///
/// Returns a `(JoinHandle, shutdown sender)` pair; send on the sender to
/// stop the flusher gracefully.
pub fn spawn_flusher(
    collector: SpanCollector,
    exporter: Arc<dyn SpanExporter>,
    flush_interval: Duration,
) -> (JoinHandle<()>, oneshot::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let task_handle = tokio::spawn(async move {
        let mut ticker = interval(flush_interval);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    let remaining = collector.drain();
                    if !remaining.is_empty() {
                        let _ = exporter.export(remaining).await;
                    }
                    break;
                }
                _ = ticker.tick() => {
                    let spans = collector.drain();
                    if !spans.is_empty() {
                        if let Err(e) = exporter.export(spans).await {
                            eprintln!("span export failed: {e}");
                        }
                    }
                }
            }
        }
    });

    (task_handle, shutdown_tx)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::monitoring::trace::{SpanKind, TraceContext};
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct RecordingExporter {
        batches: AsyncMutex<Vec<Vec<TraceSpan>>>,
    }

    #[async_trait]
    impl SpanExporter for RecordingExporter {
        async fn export(&self, spans: Vec<TraceSpan>) -> Result<(), MonitoringError> {
            self.batches.lock().await.push(spans);
            Ok(())
        }
    }

    fn finished_span() -> TraceSpan {
        let ctx = TraceContext::new_root(1.0);
        let mut span = TraceSpan::start(ctx, "test.op", SpanKind::Internal);
        span.finish();
        span
    }

    #[test]
    fn collector_drain_empties_the_buffer() {
        let collector = SpanCollector::new();
        collector.push(finished_span());
        collector.push(finished_span());
        assert_eq!(collector.len(), 2);

        let drained = collector.drain();
        assert_eq!(drained.len(), 2);
        assert!(collector.is_empty());
    }

    #[tokio::test]
    async fn console_exporter_accepts_a_batch() {
        let exporter = ConsoleSpanExporter;
        let result = exporter.export(vec![finished_span()]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn flusher_exports_remaining_spans_on_shutdown() {
        let collector = SpanCollector::new();
        collector.push(finished_span());

        let exporter = Arc::new(RecordingExporter::default());
        let (handle, shutdown_tx) =
            spawn_flusher(collector.clone(), exporter.clone(), Duration::from_secs(3600));

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        let batches = exporter.batches.lock().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
    }

    #[tokio::test]
    async fn flusher_drains_periodically() {
        let collector = SpanCollector::new();
        collector.push(finished_span());

        let exporter = Arc::new(RecordingExporter::default());
        let (handle, shutdown_tx) =
            spawn_flusher(collector.clone(), exporter.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = shutdown_tx.send(());
        handle.await.unwrap();

        let batches = exporter.batches.lock().await;
        assert!(!batches.is_empty());
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 1);
    }
}
