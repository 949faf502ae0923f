use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use trialctl::events::EventBroadcaster;
use trialctl::indicators::QualityIndicators;
use trialctl::population::Solution;
use trialctl::progress::ProgressTracker;
use trialctl::results::{Accumulator, ResultKey, ResultStore, Sample, NFE};

fn result_set(rows: u64) -> Accumulator {
    let mut acc = Accumulator::new();
    for i in 0..rows {
        acc.add(NFE, Sample::Count(i * 100));
        acc.add("Hypervolume", Sample::Real(i as f64 / rows as f64));
    }
    acc
}

fn front(n: usize) -> Vec<Solution> {
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            Solution::from_objectives(vec![t, 1.0 - t.sqrt()])
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let events = Arc::new(EventBroadcaster::new());

    // Setup: one store shared across iterations
    let store = ResultStore::new(events.clone());
    let key = ResultKey::new("RandomSearch", "ZDT1");
    let template = result_set(100);

    c.bench_function("store_add", |b| {
        b.iter(|| store.add(black_box(key.clone()), black_box(template.clone())))
    });

    let tracker = ProgressTracker::new(events.clone());
    let mut e = 0u64;
    c.bench_function("progress_update", |b| {
        b.iter(|| {
            e = (e + 7) % 10_000;
            tracker.update(black_box(e), black_box(3), 10_000, 10)
        })
    });

    let reference: Vec<Vec<f64>> = front(100).into_iter().map(|s| s.objectives).collect();
    let indicators = QualityIndicators::new(&reference).expect("reference set");
    let approx = front(50);
    c.bench_function("hypervolume_2d_50", |b| {
        b.iter(|| indicators.hypervolume(black_box(&approx)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
