//! Benchmarks for the routing hot path: topic matching and ingress queue
//! push/pop.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sensorpipe::queue::IngressQueue;
use sensorpipe::{DataKind, Delivery, Frame, Topic};
use std::sync::Arc;
use uuid::Uuid;

fn bench_topic_matching(c: &mut Criterion) {
    let frame_topic = Topic::named("random", DataKind::Int).with_source(Uuid::from_u128(7));
    let filters = [
        Topic::any(),
        Topic::of_kind(DataKind::Int),
        Topic::of_kind(DataKind::Bool),
        Topic::named("random", DataKind::Int),
        Topic::named("other", DataKind::Int),
        Topic::from_source(Uuid::from_u128(7)),
    ];

    c.bench_function("topic_match_6_filters", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            for filter in &filters {
                if filter.matches(black_box(&frame_topic)) {
                    hits += 1;
                }
            }
            hits
        })
    });
}

fn bench_queue_push_pop(c: &mut Criterion) {
    c.bench_function("queue_push_pop", |b| {
        let queue = IngressQueue::new(None);
        let frame = Arc::new(Frame::new(Topic::named("random", DataKind::Int), 1i64));
        b.iter(|| {
            queue.push(Delivery::Frame(frame.clone()));
            black_box(queue.try_pop())
        })
    });
}

fn bench_queue_push_with_dropout(c: &mut Criterion) {
    c.bench_function("queue_push_dropout", |b| {
        let queue = IngressQueue::new(Some(0.001));
        let mut t = 0.0;
        b.iter(|| {
            t += 0.0005;
            let frame = Arc::new(
                Frame::new(Topic::named("random", DataKind::Int), 1i64).with_timestamp(t),
            );
            queue.push(Delivery::Frame(frame));
        })
    });
}

criterion_group!(
    benches,
    bench_topic_matching,
    bench_queue_push_pop,
    bench_queue_push_with_dropout
);
criterion_main!(benches);
