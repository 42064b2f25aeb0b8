//! Hot-path latency: `offer` must stay O(1) whether the buffer accepts or
//! drops, since it runs on the instrumented application's request path.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use span_pipeline::{SpanBuffer, SpanData, SpanKind};

fn make_span(id: u64) -> SpanData {
    SpanData::new(1, id, 0, "bench-op", SpanKind::Internal)
}

fn bench_offer(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_offer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("accept", |b| {
        let buffer = SpanBuffer::new(1 << 20);
        let mut id = 0u64;
        b.iter(|| {
            buffer.offer(make_span(id));
            id += 1;
            if buffer.len() == buffer.capacity() {
                buffer.drain(buffer.capacity());
            }
        });
    });

    group.bench_function("drop_when_full", |b| {
        let buffer = SpanBuffer::new(16);
        for i in 0..16 {
            buffer.offer(make_span(i));
        }
        b.iter(|| {
            buffer.offer(make_span(0));
        });
    });

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_drain");
    group.throughput(Throughput::Elements(512));

    group.bench_function("drain_512", |b| {
        let buffer = SpanBuffer::new(4_096);
        b.iter(|| {
            for i in 0..512 {
                buffer.offer(make_span(i));
            }
            buffer.drain(512)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_offer, bench_drain);
criterion_main!(benches);
