// ABOUTME: Benchmark suite for the broker's hot paths: frame codec throughput and subscription
// ABOUTME: index contention under concurrent subscribe/unsubscribe/lookup traffic

use bytes::{BufMut, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pubsub_broker::codec::{data_frame_bytes, Frame, TradeMessage, TRADE_MESSAGE_SIZE};
use pubsub_broker::index::SubscriptionIndex;
use pubsub_broker::session::SessionHandle;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

fn sample_trade_message(topic_id: i32) -> TradeMessage {
    TradeMessage {
        topic_id,
        timestamp_ms: 0x0000_018F_6E4B_7A00,
        price: 100.0,
        quantity: 2.0,
    }
}

fn data_frame_wire_bytes(topic_id: i32) -> Vec<u8> {
    let mut encoded = BytesMut::new();
    sample_trade_message(topic_id).encode(&mut encoded);
    let framed = data_frame_bytes(&encoded.freeze());
    framed.to_vec()
}

fn subscribe_frame_wire_bytes(topic_id: i32) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(5);
    buf.put_u8(0x01);
    buf.put_i32(topic_id);
    buf.to_vec()
}

fn bench_frame_check(c: &mut Criterion) {
    let data = data_frame_wire_bytes(7);
    let subscribe = subscribe_frame_wire_bytes(7);

    let mut group = c.benchmark_group("frame_check");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("data", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(data.as_slice()));
            Frame::check(&mut cursor)
        })
    });

    group.bench_function("subscribe", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(subscribe.as_slice()));
            Frame::check(&mut cursor)
        })
    });

    group.finish();
}

fn bench_frame_parse(c: &mut Criterion) {
    let data = data_frame_wire_bytes(7);
    let subscribe = subscribe_frame_wire_bytes(7);

    let mut group = c.benchmark_group("frame_parse");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("data", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(data.as_slice()));
            Frame::parse(&mut cursor).unwrap()
        })
    });

    group.bench_function("subscribe", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(subscribe.as_slice()));
            Frame::parse(&mut cursor).unwrap()
        })
    });

    group.finish();
}

fn bench_trade_message_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("trade_message_roundtrip");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("encode_decode", |b| {
        b.iter(|| {
            let message = black_box(sample_trade_message(7));
            let mut buf = BytesMut::with_capacity(TRADE_MESSAGE_SIZE);
            message.encode(&mut buf);
            let mut cursor = Cursor::new(&buf[..]);
            TradeMessage::decode(&mut cursor)
        })
    });

    group.finish();
}

fn bench_index_subscribe(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_subscribe");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("new_session", |b| {
        let index = SubscriptionIndex::new();
        b.iter(|| {
            let handle = Arc::new(SessionHandle::for_test());
            index.subscribe(black_box(1), &handle);
        })
    });

    group.finish();
}

fn bench_index_subscribers_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_subscribers_lookup");
    group.measurement_time(Duration::from_secs(10));

    for &fanout in &[1usize, 10, 100, 1000] {
        let index = SubscriptionIndex::new();
        let handles: Vec<_> = (0..fanout).map(|_| Arc::new(SessionHandle::for_test())).collect();
        for handle in &handles {
            index.subscribe(1, handle);
        }

        group.bench_with_input(BenchmarkId::new("fanout", fanout), &fanout, |b, _| {
            b.iter(|| index.subscribers(black_box(1)))
        });
    }

    group.finish();
}

fn bench_index_cleanup_dead(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_cleanup_dead");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("mixed_live_and_expired", |b| {
        b.iter_batched(
            || {
                let index = SubscriptionIndex::new();
                let mut live = Vec::new();
                for topic in 0..50 {
                    let handle = Arc::new(SessionHandle::for_test());
                    index.subscribe(topic, &handle);
                    live.push(handle);
                    {
                        // subscribed, then immediately dropped: only the weak
                        // reference in the index survives
                        let expiring = Arc::new(SessionHandle::for_test());
                        index.subscribe(topic, &expiring);
                    }
                }
                (index, live)
            },
            |(index, _live)| index.cleanup_dead(),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_check,
    bench_frame_parse,
    bench_trade_message_roundtrip,
    bench_index_subscribe,
    bench_index_subscribers_lookup,
    bench_index_cleanup_dead
);
criterion_main!(benches);
