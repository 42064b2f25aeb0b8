//! Configuration loading.
//!
//! The collaborator layer that resolves environment variables into the
//! immutable value objects the core consumes. The core itself never reads the
//! environment: [`crate::processor::BatchSpanProcessor`] and
//! [`crate::remote::RemoteExporter`] take fully-resolved configs.
//!
//! Recognized variables (empty values fall back to the default):
//!
//! | Variable                          | Default           |
//! |-----------------------------------|-------------------|
//! | `TRACE_EXPORT_ENDPOINT`           | `localhost:14250` |
//! | `TRACE_EXPORT_SERVICE_NAME`       | `unknown`         |
//! | `TRACE_EXPORT_DEADLINE_MS`        | `1000` (≤0 = ∞)   |
//! | `TRACE_EXPORT_SCHEDULED_DELAY_MS` | `5000`            |
//! | `TRACE_EXPORT_MAX_QUEUE_SIZE`     | `2048`            |
//! | `TRACE_EXPORT_MAX_BATCH_SIZE`     | `512`             |

use crate::processor::ProcessorConfig;
use crate::remote::ExporterConfig;
use std::time::Duration;
use thiserror::Error;

pub const ENV_ENDPOINT: &str = "TRACE_EXPORT_ENDPOINT";
pub const ENV_SERVICE_NAME: &str = "TRACE_EXPORT_SERVICE_NAME";
pub const ENV_DEADLINE_MS: &str = "TRACE_EXPORT_DEADLINE_MS";
pub const ENV_SCHEDULED_DELAY_MS: &str = "TRACE_EXPORT_SCHEDULED_DELAY_MS";
pub const ENV_MAX_QUEUE_SIZE: &str = "TRACE_EXPORT_MAX_QUEUE_SIZE";
pub const ENV_MAX_BATCH_SIZE: &str = "TRACE_EXPORT_MAX_BATCH_SIZE";

/// Configuration errors, fatal at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Service name is required and must be non-empty.
    #[error("service name must not be empty")]
    EmptyServiceName,
    /// An option holds a value that cannot be used.
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    /// `max_export_batch_size` must not exceed `max_queue_size`.
    #[error("max export batch size {batch} exceeds max queue size {queue}")]
    BatchLargerThanQueue { batch: usize, queue: usize },
}

/// Fully-resolved configuration for one pipeline instance.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub exporter: ExporterConfig,
    pub processor: ProcessorConfig,
}

impl PipelineConfig {
    /// Resolves the configuration from the process environment.
    ///
    /// Unset or empty variables take their defaults; set-but-unparsable
    /// values are rejected rather than silently defaulted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(endpoint) = read_env(ENV_ENDPOINT) {
            config.exporter.endpoint = endpoint;
        }
        if let Some(name) = read_env(ENV_SERVICE_NAME) {
            config.exporter.service_name = name;
        }
        if let Some(raw) = read_env(ENV_DEADLINE_MS) {
            let ms: i64 = parse(ENV_DEADLINE_MS, &raw)?;
            // Zero or negative means wait indefinitely.
            config.exporter.deadline = if ms <= 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(ms as u64)
            };
        }
        if let Some(raw) = read_env(ENV_SCHEDULED_DELAY_MS) {
            let ms: u64 = parse(ENV_SCHEDULED_DELAY_MS, &raw)?;
            config.processor.scheduled_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = read_env(ENV_MAX_QUEUE_SIZE) {
            config.processor.max_queue_size = parse(ENV_MAX_QUEUE_SIZE, &raw)?;
        }
        if let Some(raw) = read_env(ENV_MAX_BATCH_SIZE) {
            config.processor.max_export_batch_size = parse(ENV_MAX_BATCH_SIZE, &raw)?;
        }

        config.exporter.validate()?;
        config.processor.validate()?;
        Ok(config)
    }
}

/// Returns the variable's trimmed value, or `None` when unset or empty.
fn read_env(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{DEFAULT_ENDPOINT, DEFAULT_SERVICE_NAME};
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            ENV_ENDPOINT,
            ENV_SERVICE_NAME,
            ENV_DEADLINE_MS,
            ENV_SCHEDULED_DELAY_MS,
            ENV_MAX_QUEUE_SIZE,
            ENV_MAX_BATCH_SIZE,
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.exporter.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.exporter.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.exporter.deadline, Duration::from_millis(1_000));
        assert_eq!(config.processor.scheduled_delay, Duration::from_secs(5));
        assert_eq!(config.processor.max_queue_size, 2_048);
        assert_eq!(config.processor.max_export_batch_size, 512);
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var(ENV_ENDPOINT, "collector.internal:14250");
        std::env::set_var(ENV_SERVICE_NAME, "checkout");
        std::env::set_var(ENV_SCHEDULED_DELAY_MS, "250");
        std::env::set_var(ENV_MAX_QUEUE_SIZE, "100");
        std::env::set_var(ENV_MAX_BATCH_SIZE, "10");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.exporter.endpoint, "collector.internal:14250");
        assert_eq!(config.exporter.service_name, "checkout");
        assert_eq!(config.processor.scheduled_delay, Duration::from_millis(250));
        assert_eq!(config.processor.max_queue_size, 100);
        assert_eq!(config.processor.max_export_batch_size, 10);
        clear_all();
    }

    #[test]
    fn test_negative_deadline_means_infinite() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var(ENV_DEADLINE_MS, "-1");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.exporter.deadline, Duration::ZERO);
        clear_all();
    }

    #[test]
    fn test_empty_value_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var(ENV_SERVICE_NAME, "   ");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.exporter.service_name, DEFAULT_SERVICE_NAME);
        clear_all();
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var(ENV_MAX_QUEUE_SIZE, "lots");

        let result = PipelineConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        clear_all();
    }

    #[test]
    fn test_batch_larger_than_queue_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var(ENV_MAX_QUEUE_SIZE, "16");
        std::env::set_var(ENV_MAX_BATCH_SIZE, "32");

        let result = PipelineConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::BatchLargerThanQueue { batch: 32, queue: 16 })
        ));
        clear_all();
    }
}
