//! Span data model.
//!
//! [`SpanData`] is the immutable record of a completed span handed to the
//! pipeline by the tracing layer. The pipeline never mutates a span: it owns
//! it while buffered, hands it to the exporter inside a [`SpanBatch`], and
//! discards it afterwards regardless of export outcome.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Typed attribute values attached to spans, events, and links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// The kind of operation a span describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

/// Completion status of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error,
}

/// A timestamped event recorded during a span's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub unix_nanos: u64,
    pub attributes: HashMap<String, AttributeValue>,
}

/// A causal link to a span in another trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanLink {
    pub trace_id: u128,
    pub span_id: u64,
    pub attributes: HashMap<String, AttributeValue>,
}

/// Immutable record of a completed span.
///
/// `parent_span_id` of 0 means the span is a trace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    pub trace_id: u128,
    pub span_id: u64,
    pub parent_span_id: u64,
    pub name: String,
    pub kind: SpanKind,
    pub start_unix_nanos: u64,
    pub end_unix_nanos: u64,
    pub status: SpanStatus,
    pub attributes: HashMap<String, AttributeValue>,
    pub events: Vec<SpanEvent>,
    pub links: Vec<SpanLink>,
}

impl SpanData {
    /// Creates a completed span with the given identity and name.
    ///
    /// Timestamps default to zero and status to `Unset`; tests and demo code
    /// fill them in with [`SpanData::with_timing`] / [`SpanData::with_status`].
    pub fn new(
        trace_id: u128,
        span_id: u64,
        parent_span_id: u64,
        name: impl Into<String>,
        kind: SpanKind,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            parent_span_id,
            name: name.into(),
            kind,
            start_unix_nanos: 0,
            end_unix_nanos: 0,
            status: SpanStatus::Unset,
            attributes: HashMap::new(),
            events: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_timing(mut self, start_unix_nanos: u64, end_unix_nanos: u64) -> Self {
        self.start_unix_nanos = start_unix_nanos;
        self.end_unix_nanos = end_unix_nanos;
        self
    }

    pub fn with_status(mut self, status: SpanStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Span duration in nanoseconds (saturating; malformed timestamps yield 0).
    pub fn duration_nanos(&self) -> u64 {
        self.end_unix_nanos.saturating_sub(self.start_unix_nanos)
    }
}

/// An ordered batch of spans captured at drain time.
///
/// Order is FIFO relative to enqueue, bounding how stale the oldest span in
/// a batch can get.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanBatch {
    pub spans: Vec<SpanData>,
}

impl SpanBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spans(spans: Vec<SpanData>) -> Self {
        Self { spans }
    }

    pub fn add(&mut self, span: SpanData) {
        self.spans.push(span);
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_saturates() {
        let span = SpanData::new(1, 1, 0, "op", SpanKind::Internal).with_timing(100, 250);
        assert_eq!(span.duration_nanos(), 150);

        let backwards = SpanData::new(1, 2, 0, "op", SpanKind::Internal).with_timing(250, 100);
        assert_eq!(backwards.duration_nanos(), 0);
    }

    #[test]
    fn test_span_serde_round_trip() {
        let span = SpanData::new(0xdead_beef, 42, 7, "GET /users", SpanKind::Server)
            .with_timing(1_000, 2_000)
            .with_status(SpanStatus::Ok)
            .with_attribute("http.status_code", AttributeValue::Int(200));

        let json = serde_json::to_string(&span).unwrap();
        let back: SpanData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut batch = SpanBatch::new();
        for i in 0..5 {
            batch.add(SpanData::new(1, i, 0, format!("op-{}", i), SpanKind::Internal));
        }
        assert_eq!(batch.len(), 5);
        let ids: Vec<u64> = batch.spans.iter().map(|s| s.span_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}
