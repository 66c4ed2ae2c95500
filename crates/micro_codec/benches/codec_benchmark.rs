//! # Codec Benchmark
//!
//! Encode and decode throughput for a game-state payload, and the cost of
//! compiling a schema catalogue.
//!
//! Run with: `cargo bench --package micro_codec`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use micro_codec::{RegisterOptions, Registry};
use serde_json::{json, Value};

const CATALOGUE: &str = r#"{
    "Zone": {
        "id": "uint8",
        "players": [{"type": "object", "schema": "Player"}]
    },
    "Player": {
        "id": "uint8",
        "posX": "uint16",
        "posY": "uint16",
        "angle": {"type": "float", "byteLength": 1, "precision": 1},
        "velocity": {"type": "float", "unsigned": true, "byteLength": 2, "precision": 3},
        "isAccelerating": "boolean",
        "isFiring": "boolean",
        "name": "string"
    }
}"#;

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register_catalog_json(CATALOGUE, RegisterOptions::default().with_max_bytes(8192))
        .expect("catalogue registers");
    registry
}

fn zone(players: usize) -> Value {
    let players: Vec<Value> = (0..players)
        .map(|i| {
            json!({
                "id": i % 256,
                "posX": i * 3,
                "posY": i * 7,
                "angle": 1.5,
                "velocity": 12.345,
                "isAccelerating": i % 2 == 0,
                "isFiring": i % 3 == 0,
                "name": format!("player-{i}")
            })
        })
        .collect();
    json!({"id": 1, "players": players})
}

/// Benchmark: Compile and register the catalogue.
fn bench_register(c: &mut Criterion) {
    c.bench_function("register_catalogue", |b| {
        b.iter(|| black_box(registry()));
    });
}

/// Benchmark: Encode zones of increasing size.
fn bench_encode(c: &mut Criterion) {
    let registry = registry();
    let mut group = c.benchmark_group("encode_zone");

    for count in [1, 16, 128] {
        let data = zone(count);
        let len = registry.to_binary(&data, "Zone", None).map_or(0, |b| b.len());
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| black_box(registry.to_binary(black_box(data), "Zone", None)));
        });
    }

    group.finish();
}

/// Benchmark: Self-describing decode of the same payloads.
fn bench_decode(c: &mut Criterion) {
    let registry = registry();
    let mut group = c.benchmark_group("decode_zone");

    for count in [1, 16, 128] {
        let bytes = registry
            .to_binary(&zone(count), "Zone", None)
            .expect("zone encodes");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| black_box(registry.to_json(black_box(bytes), None)));
        });
    }

    group.finish();
}

/// Benchmark: Encoding under a tight budget stops early.
fn bench_truncated_encode(c: &mut Criterion) {
    let registry = registry();
    let data = zone(128);

    c.bench_function("encode_zone_budget_64", |b| {
        b.iter(|| black_box(registry.to_binary(black_box(&data), "Zone", Some(64))));
    });
}

criterion_group!(
    benches,
    bench_register,
    bench_encode,
    bench_decode,
    bench_truncated_encode,
);

criterion_main!(benches);
