use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use erdos_engine::{BacktrackEngine, SolverConfig};

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    for n in [4, 8, 12, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| BacktrackEngine::new(SolverConfig::new(n)).solve());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
