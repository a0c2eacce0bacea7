//! Benchmarks for fixture generation.
//!
//! Tests:
//! - Full snapshot + CDC generation at increasing scales
//! - CDC synthesis alone over a prebuilt customers table
//! - Writing a generated dataset to disk

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dv_datagen::cdc::{synthesize, CdcTarget};
use dv_datagen::fake::FakeData;
use dv_datagen::{Counts, GenerateConfig, Generator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;
use tempfile::TempDir;

fn scaled_config(factor: usize) -> GenerateConfig {
    let base = Counts::default();
    GenerateConfig {
        counts: Counts {
            customers: base.customers * factor / 10,
            addresses: base.addresses * factor / 10,
            products: base.products * factor / 10,
            orders: base.orders * factor / 10,
            order_items: base.order_items * factor / 10,
            users: base.users * factor / 10,
            payments: base.payments * factor / 10,
        },
        ..GenerateConfig::default()
    }
}

/// Benchmark snapshot + CDC generation at 10%, 50% and 100% of the default counts
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(10);

    for factor in [1, 5, 10] {
        let config = scaled_config(factor);
        let rows = config.counts.customers + config.counts.addresses + config.counts.products;
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(
            BenchmarkId::new("snapshot_and_cdc", format!("{}0pct", factor)),
            &config,
            |b, config| {
                b.iter(|| {
                    let dataset = Generator::new(config.clone()).generate().unwrap();
                    black_box(dataset.cdc_logs.len())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark CDC synthesis over a fixed customers table
fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("cdc_synthesize");

    let config = GenerateConfig::default();
    let dataset = Generator::new(config.clone()).generate().unwrap();
    let customers = dataset.snapshot.customers;
    let [target, _, _] = CdcTarget::erp();
    group.throughput(Throughput::Elements(customers.len() as u64));

    group.bench_function("erp_customers", |b| {
        b.iter(|| {
            let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(42));
            let (log, _) = synthesize(&customers, &target, &config.dates, &config.cdc, &mut fake);
            black_box(log.len())
        })
    });

    group.finish();
}

/// Benchmark writing every output file
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.sample_size(10);

    let dataset = Generator::new(scaled_config(10)).generate().unwrap();

    group.bench_function("all_files", |b| {
        b.iter(|| {
            let temp_dir = TempDir::new().unwrap();
            let files = dataset.write(temp_dir.path()).unwrap();
            black_box(files.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_generate, bench_synthesize, bench_write);

criterion_main!(benches);
