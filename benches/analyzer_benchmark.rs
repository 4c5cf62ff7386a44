//! Benchmark suite for the transaction analyzer
//!
//! Run with: `cargo bench`

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_aml_network_analyzer::network_analysis::{detect_cycles, TransactionGraph};
use rust_aml_network_analyzer::sample_data::sample_transactions;
use rust_aml_network_analyzer::{Transaction, TransactionAnalyzer};

/// Pseudo-random transfers over `account_count` accounts, one every 7 minutes
fn synthetic_transactions(account_count: usize, transaction_count: usize) -> Vec<Transaction> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    (0..transaction_count)
        .map(|i| {
            let sender = i % account_count;
            let receiver = (i * 7 + 3) % account_count;
            Transaction::new(
                &format!("TXN_{}", i),
                &format!("ACC_{}", sender),
                &format!("ACC_{}", (receiver + usize::from(receiver == sender)) % account_count),
                100.0 + (i * 37 % 9_900) as f64,
                start + Duration::minutes(7 * i as i64),
            )
        })
        .collect()
}

fn sample_benchmark(c: &mut Criterion) {
    let transactions = sample_transactions();
    let analyzer = TransactionAnalyzer::new();

    c.bench_function("analyze/sample", |b| {
        b.iter(|| analyzer.analyze(black_box(&transactions)))
    });
}

fn analyze_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze/synthetic");
    let analyzer = TransactionAnalyzer::new();

    for size in [500, 2_000, 5_000].iter() {
        let transactions = synthetic_transactions(size / 5, *size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("transactions", size), size, |b, _| {
            b.iter(|| analyzer.analyze(black_box(&transactions)))
        });
    }

    group.finish();
}

fn graph_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");
    let transactions = synthetic_transactions(400, 2_000);

    group.bench_function("build", |b| {
        b.iter(|| TransactionGraph::build(black_box(&transactions)))
    });

    let graph = TransactionGraph::build(&transactions);
    group.bench_function("cycles", |b| b.iter(|| detect_cycles(black_box(&graph), 3, 5)));

    group.finish();
}

criterion_group!(benches, sample_benchmark, analyze_benchmark, graph_benchmark);
criterion_main!(benches);
