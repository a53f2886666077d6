//! # Swap Kernel Benchmark
//!
//! Measures:
//! 1. Whole runs (spawn, swap, join) as the worker count grows
//! 2. Claim throughput of the locked vs atomic budget under contention

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lockswap_core::sync::budget_for;
use lockswap_core::{BudgetKind, Coordinator, KernelConfig, NullReporter};

const ITERATIONS: u64 = 20_000;
const BUFFER_SIZE: usize = 64;

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(20);
    group.throughput(Throughput::Elements(ITERATIONS));

    for threads in [1usize, 2, 4, 8, 16] {
        for budget in [BudgetKind::Locked, BudgetKind::Atomic] {
            let coordinator = Coordinator::new(KernelConfig {
                threads,
                buffer_size: BUFFER_SIZE,
                iterations: ITERATIONS,
                delay_us: 0,
                monitor_ms: 0,
                seed: Some(1),
                budget,
                ..KernelConfig::default()
            })
            .unwrap();

            group.bench_with_input(
                BenchmarkId::new(budget.to_string(), threads),
                &coordinator,
                |b, coordinator| {
                    b.iter(|| black_box(coordinator.run(Box::new(NullReporter)).unwrap().completed));
                },
            );
        }
    }

    group.finish();
}

fn bench_budget_claims(c: &mut Criterion) {
    let mut group = c.benchmark_group("budget_claims");
    group.throughput(Throughput::Elements(ITERATIONS));

    for budget in [BudgetKind::Locked, BudgetKind::Atomic] {
        group.bench_function(BenchmarkId::new(budget.to_string(), 4), |b| {
            b.iter(|| {
                let shared = budget_for(budget, ITERATIONS);
                let claimers: Vec<_> = (0..4)
                    .map(|_| {
                        let shared = Arc::clone(&shared);
                        thread::spawn(move || {
                            let mut claimed = 0u64;
                            while shared.claim_one() {
                                claimed += 1;
                            }
                            claimed
                        })
                    })
                    .collect();
                let total: u64 = claimers.into_iter().map(|t| t.join().unwrap()).sum();
                black_box(total)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_run, bench_budget_claims);
criterion_main!(benches);
