//! Bounded Span Buffer
//!
//! The only data structure shared between producer threads and the export
//! worker: a capacity-bounded FIFO behind a `Mutex`. Producers push finished
//! spans with [`SpanBuffer::offer`]; the single worker removes them with
//! [`SpanBuffer::drain`]. The critical section is a push or a bounded
//! split-off, so `offer` stays O(1) on the application's hot path.

use crate::span::{SpanBatch, SpanData};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Bounded, concurrent FIFO queue of finished spans awaiting export.
pub struct SpanBuffer {
    queue: Mutex<VecDeque<SpanData>>,
    capacity: usize,
    /// Cached length so producers can check the size threshold without
    /// taking the lock.
    len: AtomicUsize,
    dropped: AtomicU64,
}

impl SpanBuffer {
    /// Creates a buffer holding at most `capacity` spans.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            len: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueues a span without blocking.
    ///
    /// Policy at capacity: drop-new. The incoming span is discarded, older
    /// spans keep their place, and the drop counter increments. Returns
    /// whether the span was accepted. Never panics to the caller.
    pub fn offer(&self, span: SpanData) -> bool {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= self.capacity {
            drop(queue);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        queue.push_back(span);
        self.len.store(queue.len(), Ordering::Relaxed);
        true
    }

    /// Atomically removes up to `max` oldest spans, in enqueue order.
    ///
    /// Returns an empty batch if nothing is queued.
    pub fn drain(&self, max: usize) -> SpanBatch {
        let mut queue = self.queue.lock().unwrap();
        let take = max.min(queue.len());
        let spans: Vec<SpanData> = queue.drain(..take).collect();
        self.len.store(queue.len(), Ordering::Relaxed);
        SpanBatch::with_spans(spans)
    }

    /// Current number of buffered spans (approximate under concurrency).
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total spans dropped because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
