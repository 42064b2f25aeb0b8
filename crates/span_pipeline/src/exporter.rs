//! Exporter contract and built-in sinks.
//!
//! A [`SpanExporter`] translates a [`SpanBatch`] to a backend's data model and
//! transmits it in one call. A batch succeeds or fails as a unit; there is no
//! partial-batch granularity and the pipeline never retries a failed batch.

use crate::span::SpanBatch;
use std::future::Future;
use thiserror::Error;

/// Error types for span export operations
#[derive(Debug, Error, Clone)]
pub enum ExportError {
    /// Transport-layer error (network, gRPC, HTTP)
    #[error("transport error: {0}")]
    Transport(String),
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Export call exceeded its deadline
    #[error("export deadline exceeded")]
    DeadlineExceeded,
    /// Exporter was asked to export after shutdown
    #[error("exporter is shut down")]
    Shutdown,
}

/// Outcome of an export, flush, or shutdown call. A batch is all-or-nothing.
pub type ExportResult = Result<(), ExportError>;

/// Trait for exporting span batches to a backend.
///
/// Uses native async fn in traits; `impl Future` return types are not
/// object-safe, so dynamic dispatch goes through [`SpanExporterBoxed`].
///
/// The pipeline calls `export` from a single worker task, so implementations
/// need not be safe for concurrent export calls.
pub trait SpanExporter: Send + Sync {
    /// Exports a batch of spans.
    fn export(&self, batch: SpanBatch) -> impl Future<Output = ExportResult> + Send;

    /// Flushes any buffering internal to the backend.
    ///
    /// Defaults to success: most exporters transmit eagerly and have nothing
    /// of their own to flush.
    fn force_flush(&self) -> impl Future<Output = ExportResult> + Send {
        async { Ok(()) }
    }

    /// Releases the exporter's connection or channel. Defaults to a no-op.
    fn shutdown(&self) -> impl Future<Output = ExportResult> + Send {
        async { Ok(()) }
    }

    /// Returns the exporter name for debugging.
    fn name(&self) -> &str;
}

/// Object-safe version of [`SpanExporter`] for dynamic dispatch.
pub trait SpanExporterBoxed: Send + Sync {
    /// Exports a batch of spans (boxed future for object safety).
    fn export_boxed(
        &self,
        batch: SpanBatch,
    ) -> std::pin::Pin<Box<dyn Future<Output = ExportResult> + Send + '_>>;

    /// Flushes backend-internal buffering (boxed future for object safety).
    fn force_flush_boxed(&self)
        -> std::pin::Pin<Box<dyn Future<Output = ExportResult> + Send + '_>>;

    /// Releases the exporter's resources (boxed future for object safety).
    fn shutdown_boxed(&self) -> std::pin::Pin<Box<dyn Future<Output = ExportResult> + Send + '_>>;

    /// Returns the exporter name for debugging.
    fn name(&self) -> &str;
}

/// Blanket implementation: any SpanExporter can be used as SpanExporterBoxed
impl<T: SpanExporter> SpanExporterBoxed for T {
    fn export_boxed(
        &self,
        batch: SpanBatch,
    ) -> std::pin::Pin<Box<dyn Future<Output = ExportResult> + Send + '_>> {
        Box::pin(self.export(batch))
    }

    fn force_flush_boxed(
        &self,
    ) -> std::pin::Pin<Box<dyn Future<Output = ExportResult> + Send + '_>> {
        Box::pin(self.force_flush())
    }

    fn shutdown_boxed(&self) -> std::pin::Pin<Box<dyn Future<Output = ExportResult> + Send + '_>> {
        Box::pin(self.shutdown())
    }

    fn name(&self) -> &str {
        SpanExporter::name(self)
    }
}

/// Stdout exporter for testing and debugging
pub struct StdoutExporter {
    verbose: bool,
}

impl StdoutExporter {
    /// Creates a new stdout exporter
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl SpanExporter for StdoutExporter {
    async fn export(&self, batch: SpanBatch) -> ExportResult {
        if self.verbose {
            println!("=== Exporting {} spans ===", batch.spans.len());
            for span in &batch.spans {
                println!(
                    "Span: trace_id={:032x} span_id={:016x} name={} duration={}ns status={:?}",
                    span.trace_id,
                    span.span_id,
                    span.name,
                    span.duration_nanos(),
                    span.status
                );
            }
            println!("=== Export complete ===\n");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// JSON-lines file exporter for local development.
///
/// Appends one JSON array per exported batch.
pub struct JsonFileExporter {
    file_path: String,
}

impl JsonFileExporter {
    /// Creates a new JSON file exporter
    pub fn new(file_path: String) -> Self {
        Self { file_path }
    }
}

impl SpanExporter for JsonFileExporter {
    async fn export(&self, batch: SpanBatch) -> ExportResult {
        let mut line = serde_json::to_string(&batch.spans)
            .map_err(|e| ExportError::Serialization(e.to_string()))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await
            .map_err(|e| ExportError::Transport(e.to_string()))?;

        tokio::io::AsyncWriteExt::write_all(&mut file, line.as_bytes())
            .await
            .map_err(|e| ExportError::Transport(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "json_file"
    }
}

/// Null exporter that discards all spans (for benchmarking)
pub struct NullExporter;

impl NullExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanExporter for NullExporter {
    async fn export(&self, _batch: SpanBatch) -> ExportResult {
        // Discard all spans
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
