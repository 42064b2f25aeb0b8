//! Telemetry Span Export Pipeline
//!
//! Accepts completed trace spans from an instrumentation layer, buffers them,
//! and periodically delivers them as batches to a collection backend —
//! tolerating backend slowness and transient failures without ever blocking
//! the instrumented application.
//!
//! The centerpiece is [`BatchSpanProcessor`]: producers call
//! [`BatchSpanProcessor::on_end`] synchronously on the hot path; a single
//! background worker drains the bounded buffer and drives a pluggable
//! [`SpanExporter`]. Delivery is best-effort by design: a full buffer drops
//! new spans, a failed batch is discarded, and all buffering is in-memory.
//!
//! ```rust,ignore
//! use span_pipeline::{BatchSpanProcessor, ProcessorConfig, StdoutExporter};
//! use std::sync::Arc;
//!
//! let exporter = Arc::new(StdoutExporter::new(true));
//! let processor = BatchSpanProcessor::new(ProcessorConfig::default(), exporter)?;
//!
//! processor.on_end(finished_span);   // O(1), never blocks
//! processor.force_flush().await?;    // drain everything now
//! processor.shutdown().await?;       // final drain + exporter shutdown
//! ```

pub mod buffer;
pub mod config;
pub mod deadline;
pub mod exporter;
pub mod processor;
pub mod remote;
pub mod span;

// Re-export main types
pub use buffer::SpanBuffer;
pub use config::{ConfigError, PipelineConfig};
pub use deadline::DeadlineExporter;
pub use exporter::{
    ExportError, ExportResult, JsonFileExporter, NullExporter, SpanExporter, SpanExporterBoxed,
    StdoutExporter,
};
pub use processor::{BatchSpanProcessor, ProcessorConfig, ProcessorMetrics};
pub use remote::{BatchTransport, ExporterConfig, RemoteExporter};
pub use span::{AttributeValue, SpanBatch, SpanData, SpanEvent, SpanKind, SpanLink, SpanStatus};
