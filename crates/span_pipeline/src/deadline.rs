//! Deadline Wrapper
//!
//! [`DeadlineExporter`] bounds each export call of an inner exporter with a
//! deadline so a stalled backend cannot pin the pipeline's worker. A zero
//! deadline disables the bound entirely: the call waits for the backend or
//! for the pipeline's own cancellation. That opt-out exists for backends with
//! their own deadline enforcement; use it cautiously.

use crate::exporter::{ExportError, ExportResult, SpanExporter};
use crate::span::SpanBatch;
use std::time::Duration;
use tokio::time::timeout;

/// An exporter wrapper that fails exports exceeding a fixed deadline.
///
/// # Example
///
/// ```ignore
/// let exporter = DeadlineExporter::new(backend, Duration::from_millis(1_000));
/// // export() now returns Err(ExportError::DeadlineExceeded) after 1s
/// ```
pub struct DeadlineExporter<E: SpanExporter> {
    inner: E,
    deadline: Duration,
}

impl<E: SpanExporter> DeadlineExporter<E> {
    /// Wraps `inner` with the given per-call deadline.
    ///
    /// `Duration::ZERO` means wait indefinitely.
    pub fn new(inner: E, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// The configured per-call deadline (zero = unbounded).
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// The wrapped exporter.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: SpanExporter> SpanExporter for DeadlineExporter<E> {
    async fn export(&self, batch: SpanBatch) -> ExportResult {
        if self.deadline.is_zero() {
            return self.inner.export(batch).await;
        }

        match timeout(self.deadline, self.inner.export(batch)).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::DeadlineExceeded),
        }
    }

    async fn force_flush(&self) -> ExportResult {
        self.inner.force_flush().await
    }

    async fn shutdown(&self) -> ExportResult {
        self.inner.shutdown().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
