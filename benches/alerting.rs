//! Alerting benchmark: threshold decisions and stable ranking over scored flows.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flow_sentry::alerts::{decide, rank, AlertEngine, ScoredFlow};

fn make_flows(n: usize) -> Vec<ScoredFlow> {
    let engine = AlertEngine::new(0.5).unwrap();
    (0..n)
        .map(|i| {
            // coarse buckets so ties are common
            let p = ((i * 7919) % 100) as f32 / 100.0;
            engine.score_flow(i, vec![("Src IP".to_string(), format!("10.0.{}.{}", i / 256 % 256, i % 256))], p)
        })
        .collect()
}

fn bench_decide(c: &mut Criterion) {
    let probs: Vec<f32> = (0..10_000).map(|i| (i % 1000) as f32 / 1000.0).collect();
    c.bench_function("decide_10k", |b| {
        b.iter(|| probs.iter().map(|p| decide(*p, black_box(0.7)) as usize).sum::<usize>())
    });
}

fn bench_rank(c: &mut Criterion) {
    let mut g = c.benchmark_group("rank_by_size");
    for n in [1_000, 10_000, 100_000] {
        let flows = make_flows(n);
        g.bench_function(format!("flows_{}", n).as_str(), |b| {
            b.iter(|| black_box(rank(black_box(flows.clone()))))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_decide, bench_rank);
criterion_main!(benches);
