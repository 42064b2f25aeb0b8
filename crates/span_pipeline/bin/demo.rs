//! # Span Export Pipeline Demo
//!
//! End-to-end demonstration of the batching span processor against a
//! simulated backend with configurable latency and failure rate.
//!
//! Shows:
//! - the fire-and-forget hot path (`on_end` from several producer tasks)
//! - deadline enforcement via `DeadlineExporter`
//! - explicit `force_flush` and graceful shutdown with a final drain
//! - drop accounting when producers outrun the queue
//!
//! ## Running
//!
//! ```bash
//! cargo run -p span_pipeline --bin demo --release
//! ```

use rand::Rng;
use span_pipeline::{
    AttributeValue, BatchSpanProcessor, DeadlineExporter, ExportError, ExportResult,
    PipelineConfig, SpanBatch, SpanData, SpanExporter, SpanKind, SpanStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A simulated backend exporter that occasionally fails.
struct SimulatedBackendExporter {
    /// Probability of failure (0.0 - 1.0)
    failure_rate: f64,
    /// Simulated latency per export
    latency: Duration,
    export_attempts: AtomicU64,
    failed_exports: AtomicU64,
}

impl SimulatedBackendExporter {
    fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate,
            latency,
            export_attempts: AtomicU64::new(0),
            failed_exports: AtomicU64::new(0),
        }
    }
}

impl SpanExporter for SimulatedBackendExporter {
    async fn export(&self, batch: SpanBatch) -> ExportResult {
        self.export_attempts.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;

        let roll: f64 = rand::thread_rng().gen();
        if roll < self.failure_rate {
            self.failed_exports.fetch_add(1, Ordering::Relaxed);
            return Err(ExportError::Transport(format!(
                "backend rejected batch of {} spans",
                batch.len()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated-backend"
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

fn make_span(producer_id: u64, seq: u64) -> SpanData {
    let start = unix_nanos();
    let operations = ["GET /users", "SELECT users", "cache.get", "queue.publish"];
    let name = operations[(seq % operations.len() as u64) as usize];

    SpanData::new(
        u128::from(producer_id) << 64 | u128::from(seq / 16 + 1),
        producer_id << 48 | seq,
        if seq % 5 == 0 { 0 } else { producer_id << 48 | (seq - 1) },
        name,
        SpanKind::Server,
    )
    .with_timing(start, start + 1_500_000)
    .with_status(if seq % 10 == 9 { SpanStatus::Error } else { SpanStatus::Ok })
    .with_attribute("service.instance.id", AttributeValue::Int(producer_id as i64))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = PipelineConfig::from_env().expect("invalid pipeline configuration");
    println!("=== Span Export Pipeline Demo ===");
    println!(
        "endpoint={} service={} queue={} batch={} delay={:?}\n",
        config.exporter.endpoint,
        config.exporter.service_name,
        config.processor.max_queue_size,
        config.processor.max_export_batch_size,
        config.processor.scheduled_delay,
    );

    // 5% failure rate, 2ms simulated round trip, bounded by the configured deadline.
    let backend = SimulatedBackendExporter::new(0.05, Duration::from_millis(2));
    let exporter = Arc::new(DeadlineExporter::new(backend, config.exporter.deadline));

    let mut processor_config = config.processor.clone();
    processor_config.scheduled_delay = Duration::from_millis(200);
    let processor =
        Arc::new(BatchSpanProcessor::new(processor_config, exporter.clone()).unwrap());

    let start = Instant::now();
    let mut producers = vec![];
    for producer_id in 0..4u64 {
        let processor = Arc::clone(&processor);
        producers.push(tokio::spawn(async move {
            for seq in 0..2_500 {
                processor.on_end(make_span(producer_id, seq));
                if seq % 100 == 99 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }));
    }
    for producer in producers {
        producer.await.expect("producer task panicked");
    }

    processor.force_flush().await.ok();
    processor.shutdown().await.ok();
    let elapsed = start.elapsed();

    let metrics = processor.metrics();
    let backend = exporter.inner();
    println!("\n=== Results ({:?}) ===", elapsed);
    println!("spans exported:   {}", metrics.spans_exported());
    println!("batches exported: {}", metrics.batches_exported());
    println!("export errors:    {}", metrics.export_errors());
    println!("spans dropped:    {}", metrics.spans_dropped());
    println!(
        "backend attempts: {} ({} failed)",
        backend.export_attempts.load(Ordering::Relaxed),
        backend.failed_exports.load(Ordering::Relaxed)
    );
}
