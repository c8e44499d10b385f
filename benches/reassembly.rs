//! Benchmarks for byte-stream reassembly and frame decoding
//!
//! Tracks the cost of the hot ingestion path:
//! - Draining a large chunk containing many complete frames
//! - Worst-case fragmentation (one byte per feed call)
//! - Raw frame decode in isolation

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use lumitel::{FRAME_SIZE, FrameReassembler, RawFrame};
use std::hint::black_box;

fn build_stream(frames: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(frames * FRAME_SIZE);
    for i in 0..frames {
        let frame = RawFrame {
            led_index: (i % 4) as u8,
            sensors: [i as i32, -(i as i32), 7, 42],
            timestamp: (i * 50) as u32,
        };
        stream.extend_from_slice(&frame.encode());
    }
    stream
}

fn bench_bulk_drain(c: &mut Criterion) {
    let stream = build_stream(1000);

    let mut group = c.benchmark_group("reassembly_bulk");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("drain_1000_frames_one_chunk", |b| {
        b.iter(|| {
            let mut reassembler = FrameReassembler::new(1 << 20);
            let decoded = reassembler
                .feed(black_box(&stream))
                .expect("under cap")
                .count();
            black_box(decoded)
        })
    });

    group.finish();
}

fn bench_byte_by_byte(c: &mut Criterion) {
    let stream = build_stream(100);

    let mut group = c.benchmark_group("reassembly_fragmented");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("one_byte_per_feed", |b| {
        b.iter(|| {
            let mut reassembler = FrameReassembler::new(1 << 20);
            let mut decoded = 0usize;
            for byte in &stream {
                decoded += reassembler
                    .feed(black_box(std::slice::from_ref(byte)))
                    .expect("under cap")
                    .count();
            }
            black_box(decoded)
        })
    });

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let frame = RawFrame { led_index: 2, sensors: [1, 2, 3, 4], timestamp: 12345 };
    let bytes = frame.encode();

    c.bench_function("raw_frame_decode", |b| {
        b.iter(|| {
            let decoded = RawFrame::decode(black_box(&bytes)).expect("valid frame");
            black_box(decoded)
        })
    });
}

criterion_group!(benches, bench_bulk_drain, bench_byte_by_byte, bench_frame_decode);
criterion_main!(benches);
