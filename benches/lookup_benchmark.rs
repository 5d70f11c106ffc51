//! Benchmarks for Tor list lookups.
//!
//! Run with: cargo bench
//!
//! This benchmark suite measures:
//! - Lookup throughput for hits and misses
//! - Scalability with list size
//! - Cost of swapping in a new list

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::net::IpAddr;
use torlist::{IpSet, LiveStore};

/// Generate a list of `count` distinct IPv4 addresses.
fn generate_list(count: usize) -> IpSet {
    (0..count as u32)
        .map(|i| IpAddr::from((0x0a00_0000u32 + i).to_be_bytes()))
        .collect()
}

/// Generate queries - mix of hits and misses.
fn generate_queries(count: usize, list_size: usize, hit_ratio: f64) -> Vec<String> {
    let hits = (count as f64 * hit_ratio) as usize;
    let mut queries = Vec::with_capacity(count);

    for i in 0..hits {
        let ip = IpAddr::from((0x0a00_0000u32 + (i % list_size) as u32).to_be_bytes());
        queries.push(ip.to_string());
    }
    for i in hits..count {
        queries.push(format!("192.0.2.{}", i % 256));
    }

    queries
}

fn bench_mixed_lookups(c: &mut Criterion) {
    let store = LiveStore::with_set(generate_list(2_000));
    let queries = generate_queries(1_000, 2_000, 0.2);

    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("mixed_queries", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(store.contains(q));
            }
        })
    });

    group.bench_function("single_hit", |b| {
        b.iter(|| black_box(store.contains("10.0.0.42")))
    });

    group.bench_function("single_miss", |b| {
        b.iter(|| black_box(store.contains("203.0.113.9")))
    });

    group.bench_function("invalid_input", |b| {
        b.iter(|| black_box(store.contains("not-an-ip")))
    });

    group.finish();
}

fn bench_list_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_size");

    for size in [100, 2_000, 10_000, 50_000].iter() {
        let store = LiveStore::with_set(generate_list(*size));
        let queries = generate_queries(100, *size, 0.5);

        group.throughput(Throughput::Elements(100));
        group.bench_with_input(BenchmarkId::new("ips", size), size, |b, _| {
            b.iter(|| {
                for q in &queries {
                    black_box(store.contains(q));
                }
            })
        });
    }

    group.finish();
}

fn bench_replace(c: &mut Criterion) {
    let store = LiveStore::new();
    let body = generate_list(2_000).to_lines();

    let mut group = c.benchmark_group("replace");
    group.bench_function("parse_and_swap_2k", |b| {
        b.iter(|| store.replace(IpSet::parse(black_box(&body))))
    });
    group.finish();
}

criterion_group!(benches, bench_mixed_lookups, bench_list_size, bench_replace);
criterion_main!(benches);
