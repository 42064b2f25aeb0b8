//! Remote Backend Adapter
//!
//! [`RemoteExporter`] is the exporter shape for a real collection backend. The
//! wire encoding and the network client live behind the narrow
//! [`BatchTransport`] seam; this adapter contributes the contract every
//! backend must satisfy:
//!
//! - identifying fields are validated at construction, not at first export
//! - every send is bounded by the configured deadline
//! - transport failures are converted to [`ExportError`], never panics
//! - shutdown closes the transport gracefully within a grace period and
//!   proceeds regardless afterwards

use crate::config::ConfigError;
use crate::exporter::{ExportError, ExportResult, SpanExporter};
use crate::span::SpanBatch;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Default collector endpoint, matching the conventional collector port.
pub const DEFAULT_ENDPOINT: &str = "localhost:14250";
/// Service name reported when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "unknown";
/// Default per-call deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(1_000);
/// Default grace period for closing the transport on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Immutable configuration for a remote exporter.
///
/// Replaces fluent builder state with a value object validated once at
/// construction.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Backend address, `host:port`.
    pub endpoint: String,
    /// Name identifying the instrumented service. Required, non-empty.
    pub service_name: String,
    /// Max wait per export call. Zero means wait indefinitely.
    pub deadline: Duration,
    /// Max wait for a graceful transport close on shutdown.
    pub shutdown_grace: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            deadline: DEFAULT_DEADLINE,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ExporterConfig {
    /// Checks required fields. Called by [`RemoteExporter::new`] so a
    /// misconfigured pipeline fails before any background resource exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        Ok(())
    }
}

/// Narrow seam to a backend's wire format and network client.
///
/// Implementations own the encoding of [`SpanBatch`] into the backend's data
/// model and the actual network call. They do not need their own deadline
/// handling; [`RemoteExporter`] bounds every `send`.
pub trait BatchTransport: Send + Sync {
    /// Encodes and transmits one batch.
    fn send(&self, batch: SpanBatch) -> impl Future<Output = ExportResult> + Send;

    /// Closes the connection/channel. Defaults to a no-op.
    fn close(&self) -> impl Future<Output = ExportResult> + Send {
        async { Ok(()) }
    }
}

/// Exporter adapter wiring a [`BatchTransport`] into the pipeline.
pub struct RemoteExporter<T: BatchTransport> {
    transport: T,
    config: ExporterConfig,
}

impl<T: BatchTransport> RemoteExporter<T> {
    /// Validates `config` and builds the adapter.
    ///
    /// Fails fast on an empty service name; no transport call is made here.
    pub fn new(config: ExporterConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }
}

impl<T: BatchTransport> SpanExporter for RemoteExporter<T> {
    async fn export(&self, batch: SpanBatch) -> ExportResult {
        if self.config.deadline.is_zero() {
            return self.transport.send(batch).await;
        }

        match timeout(self.config.deadline, self.transport.send(batch)).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::DeadlineExceeded),
        }
    }

    async fn shutdown(&self) -> ExportResult {
        match timeout(self.config.shutdown_grace, self.transport.close()).await {
            Ok(result) => result,
            Err(_) => {
                // Grace elapsed: the transport is abandoned, not waited on.
                warn!(
                    grace_ms = self.config.shutdown_grace.as_millis() as u64,
                    "transport did not close within the shutdown grace period"
                );
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{SpanData, SpanKind};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct MockTransport {
        sent: Mutex<Vec<usize>>,
        closed: AtomicU32,
        send_delay: Duration,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                closed: AtomicU32::new(0),
                send_delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                send_delay: delay,
                ..Self::new()
            }
        }
    }

    impl BatchTransport for MockTransport {
        async fn send(&self, batch: SpanBatch) -> ExportResult {
            if !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            self.sent.lock().unwrap().push(batch.len());
            Ok(())
        }

        async fn close(&self) -> ExportResult {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn make_batch() -> SpanBatch {
        SpanBatch::with_spans(vec![SpanData::new(1, 1, 0, "test", SpanKind::Internal)])
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let config = ExporterConfig {
            service_name: "   ".to_string(),
            ..Default::default()
        };
        let result = RemoteExporter::new(config, MockTransport::new());
        assert!(matches!(result, Err(ConfigError::EmptyServiceName)));
    }

    #[tokio::test]
    async fn test_send_within_deadline() {
        let exporter =
            RemoteExporter::new(ExporterConfig::default(), MockTransport::new()).unwrap();
        exporter.export(make_batch()).await.unwrap();
        assert_eq!(*exporter.transport.sent.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_slow_transport_hits_deadline() {
        let config = ExporterConfig {
            deadline: Duration::from_millis(20),
            ..Default::default()
        };
        let exporter =
            RemoteExporter::new(config, MockTransport::slow(Duration::from_secs(60))).unwrap();

        let result = exporter.export(make_batch()).await;
        assert!(matches!(result, Err(ExportError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_zero_deadline_is_unbounded() {
        let config = ExporterConfig {
            deadline: Duration::ZERO,
            ..Default::default()
        };
        let exporter =
            RemoteExporter::new(config, MockTransport::slow(Duration::from_millis(100))).unwrap();

        assert!(exporter.export(make_batch()).await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_closes_transport() {
        let exporter =
            RemoteExporter::new(ExporterConfig::default(), MockTransport::new()).unwrap();
        exporter.shutdown().await.unwrap();
        assert_eq!(exporter.transport.closed.load(Ordering::Relaxed), 1);
    }
}
