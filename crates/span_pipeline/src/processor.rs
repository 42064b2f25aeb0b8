//! Batch Span Processor
//!
//! The orchestrator decoupling span production from span export. Application
//! threads hand finished spans to [`BatchSpanProcessor::on_end`], which is a
//! synchronous O(1) enqueue; a single background worker owns the exporter and
//! drains the buffer in slices of at most `max_export_batch_size`.
//!
//! Three triggers drive an export cycle, first to fire wins:
//!
//! 1. the interval timer (`scheduled_delay`)
//! 2. the size threshold (buffer reaches `max_export_batch_size`)
//! 3. an explicit [`BatchSpanProcessor::force_flush`] or
//!    [`BatchSpanProcessor::shutdown`]
//!
//! Because the worker exports inline, at most one export is ever in flight
//! against the exporter; a trigger firing mid-export coalesces into the
//! worker's next loop iteration.
//!
//! Delivery is best-effort: a failed batch is discarded, never re-enqueued,
//! and nothing from this pipeline propagates into `on_end` callers.

use crate::buffer::SpanBuffer;
use crate::config::ConfigError;
use crate::exporter::{ExportError, ExportResult, SpanExporterBoxed};
use crate::span::{SpanBatch, SpanData};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Configuration for the batch processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum number of buffered spans; spans beyond this are dropped.
    pub max_queue_size: usize,
    /// Maximum number of spans handed to the exporter in one call.
    pub max_export_batch_size: usize,
    /// Interval between timer-driven export cycles.
    pub scheduled_delay: Duration,
    /// Bound on a `force_flush` call, covering all its slices.
    pub export_timeout: Duration,
    /// Bound on `shutdown`; on elapse the processor proceeds regardless.
    pub shutdown_grace: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 2_048,
            max_export_batch_size: 512,
            scheduled_delay: Duration::from_secs(5),
            export_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ProcessorConfig {
    /// Checks the size invariants before any background resource is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_queue_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_queue_size".to_string(),
                value: "0".to_string(),
            });
        }
        if self.max_export_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_export_batch_size".to_string(),
                value: "0".to_string(),
            });
        }
        if self.max_export_batch_size > self.max_queue_size {
            return Err(ConfigError::BatchLargerThanQueue {
                batch: self.max_export_batch_size,
                queue: self.max_queue_size,
            });
        }
        Ok(())
    }
}

/// Thread-safe counters observable while the pipeline runs.
///
/// Failures are visible only here, never through `on_end`.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    spans_exported: AtomicU64,
    batches_exported: AtomicU64,
    export_errors: AtomicU64,
    spans_dropped: AtomicU64,
}

impl ProcessorMetrics {
    pub fn spans_exported(&self) -> u64 {
        self.spans_exported.load(Ordering::Relaxed)
    }

    pub fn batches_exported(&self) -> u64 {
        self.batches_exported.load(Ordering::Relaxed)
    }

    pub fn export_errors(&self) -> u64 {
        self.export_errors.load(Ordering::Relaxed)
    }

    pub fn spans_dropped(&self) -> u64 {
        self.spans_dropped.load(Ordering::Relaxed)
    }

    fn record_success(&self, span_count: u64) {
        self.spans_exported.fetch_add(span_count, Ordering::Relaxed);
        self.batches_exported.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.export_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_drop(&self) {
        self.spans_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

enum Control {
    Flush(oneshot::Sender<ExportResult>),
    Shutdown(oneshot::Sender<ExportResult>),
}

/// Asynchronous batching processor between the tracing layer and an exporter.
pub struct BatchSpanProcessor {
    buffer: Arc<SpanBuffer>,
    metrics: Arc<ProcessorMetrics>,
    size_notify: Arc<Notify>,
    control_tx: mpsc::Sender<Control>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_started: AtomicBool,
    config: ProcessorConfig,
}

impl BatchSpanProcessor {
    /// Validates `config` and spawns the export worker.
    ///
    /// The exporter is owned exclusively by the worker from here on.
    pub fn new(
        config: ProcessorConfig,
        exporter: Arc<dyn SpanExporterBoxed>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let buffer = Arc::new(SpanBuffer::new(config.max_queue_size));
        let metrics = Arc::new(ProcessorMetrics::default());
        let size_notify = Arc::new(Notify::new());
        let (control_tx, control_rx) = mpsc::channel(4);

        let worker = Worker {
            buffer: Arc::clone(&buffer),
            exporter,
            metrics: Arc::clone(&metrics),
            size_notify: Arc::clone(&size_notify),
            control_rx,
            config: config.clone(),
        };
        let handle = tokio::spawn(worker.run());

        Ok(Self {
            buffer,
            metrics,
            size_notify,
            control_tx,
            worker: Mutex::new(Some(handle)),
            shutdown_started: AtomicBool::new(false),
            config,
        })
    }

    /// Accepts a finished span from the tracing layer.
    ///
    /// Synchronous, O(1), no I/O: one bounded queue push plus a cheap
    /// size-threshold check that wakes the worker. A full buffer drops the
    /// span and counts it; nothing is ever raised to the caller.
    pub fn on_end(&self, span: SpanData) {
        if self.shutdown_started.load(Ordering::Relaxed) {
            self.metrics.record_drop();
            return;
        }

        if !self.buffer.offer(span) {
            self.metrics.record_drop();
            return;
        }

        if self.buffer.len() >= self.config.max_export_batch_size {
            self.size_notify.notify_one();
        }
    }

    /// Drains the whole buffer through the exporter, blocking the caller.
    ///
    /// Spans go out in slices no larger than `max_export_batch_size`, one
    /// sequential export call per slice, FIFO. Any failed slice makes the
    /// overall result a failure, but draining continues: failed batches are
    /// discarded, not retried. Bounded by `export_timeout`.
    pub async fn force_flush(&self) -> ExportResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .control_tx
            .send(Control::Flush(reply_tx))
            .await
            .is_err()
        {
            return Err(ExportError::Shutdown);
        }

        match timeout(self.config.export_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ExportError::Shutdown),
            Err(_) => Err(ExportError::DeadlineExceeded),
        }
    }

    /// Stops the scheduler, drains the remaining buffer, shuts the exporter
    /// down, and releases the worker.
    ///
    /// Idempotent: a second call is a no-op returning success. Bounded by
    /// `shutdown_grace`; on elapse a warning is logged and shutdown proceeds
    /// without waiting for the in-flight export, which is left to finish or
    /// hit its own deadline.
    pub async fn shutdown(&self) -> ExportResult {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .control_tx
            .send(Control::Shutdown(reply_tx))
            .await
            .is_err()
        {
            // Worker already gone; nothing left to drain.
            return Ok(());
        }

        let handle = self.worker.lock().unwrap().take();
        match timeout(self.config.shutdown_grace, reply_rx).await {
            Ok(Ok(result)) => {
                if let Some(handle) = handle {
                    let _ = handle.await;
                }
                result
            }
            Ok(Err(_)) => Ok(()),
            Err(_) => {
                warn!(
                    grace_ms = self.config.shutdown_grace.as_millis() as u64,
                    "shutdown did not finish within the grace period; proceeding"
                );
                drop(handle);
                Ok(())
            }
        }
    }

    /// Export/drop counters for this processor instance.
    pub fn metrics(&self) -> &Arc<ProcessorMetrics> {
        &self.metrics
    }

    /// Current number of buffered spans.
    pub fn queued_spans(&self) -> usize {
        self.buffer.len()
    }
}

struct Worker {
    buffer: Arc<SpanBuffer>,
    exporter: Arc<dyn SpanExporterBoxed>,
    metrics: Arc<ProcessorMetrics>,
    size_notify: Arc<Notify>,
    control_rx: mpsc::Receiver<Control>,
    config: ProcessorConfig,
}

impl Worker {
    async fn run(mut self) {
        // First tick after one full delay, not immediately.
        let mut ticker = interval_at(
            Instant::now() + self.config.scheduled_delay,
            self.config.scheduled_delay,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.export_cycle().await;
                }

                () = self.size_notify.notified() => {
                    self.export_cycle().await;
                    // A stored permit may stand for many threshold crossings;
                    // re-arm instead of looping so flush/shutdown requests
                    // are not starved while producers keep the buffer full.
                    if self.buffer.len() >= self.config.max_export_batch_size {
                        self.size_notify.notify_one();
                    }
                }

                msg = self.control_rx.recv() => match msg {
                    Some(Control::Flush(reply)) => {
                        let result = self.drain_all().await;
                        let _ = reply.send(result);
                        ticker.reset();
                    }
                    Some(Control::Shutdown(reply)) => {
                        let result = self.drain_all().await;
                        if let Err(e) = self.exporter.shutdown_boxed().await {
                            warn!(exporter = self.exporter.name(), error = %e,
                                "exporter shutdown failed");
                        }
                        let _ = reply.send(result);
                        break;
                    }
                    // Processor handle dropped without shutdown; stop quietly.
                    None => break,
                },
            }
        }
    }

    /// Drains one slice and exports it. Errors are terminal for the batch.
    async fn export_cycle(&self) {
        let batch = self.buffer.drain(self.config.max_export_batch_size);
        if batch.is_empty() {
            return;
        }
        let _ = self.export_batch(batch).await;
    }

    async fn export_batch(&self, batch: SpanBatch) -> ExportResult {
        let span_count = batch.len() as u64;
        match self.exporter.export_boxed(batch).await {
            Ok(()) => {
                self.metrics.record_success(span_count);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_error();
                debug!(exporter = self.exporter.name(), error = %e, spans = span_count,
                    "export failed; batch discarded");
                Err(e)
            }
        }
    }

    /// Drains everything in bounded slices, then flushes the exporter.
    ///
    /// Aggregate outcome: any slice failure fails the whole flush, but every
    /// queued span is still drained exactly once.
    async fn drain_all(&self) -> ExportResult {
        let mut result = Ok(());
        loop {
            let batch = self.buffer.drain(self.config.max_export_batch_size);
            if batch.is_empty() {
                break;
            }
            if let Err(e) = self.export_batch(batch).await {
                result = Err(e);
            }
        }

        match self.exporter.force_flush_boxed().await {
            Ok(()) => result,
            Err(e) => {
                self.metrics.record_error();
                Err(e)
            }
        }
    }
}
