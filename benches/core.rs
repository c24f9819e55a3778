use std::time::Duration;

use cafbench::runtime::{Layout, Runtime, ThreadTeam};
use cafbench::statistics::{compute_stats, StatsMode, TimeSeries};
use cafbench::{check_timing, RepetitionController};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller");
    let target = Duration::from_millis(500);

    group.bench_function("check_timing", |b| {
        b.iter(|| check_timing(black_box(1024), black_box(Duration::from_millis(600)), target));
    });

    group.bench_function("converge_from_one", |b| {
        b.iter(|| {
            // 1us per repetition: doubles about twenty times before the first overshoot.
            let mut ctl = RepetitionController::new(target, 1).unwrap();
            while ctl.check(Duration::from_micros(ctl.nrep() as u64)) {}
            black_box(ctl.nrep())
        });
    });
    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_stats");
    for outer in [10usize, 100, 1000] {
        let series: TimeSeries = (0..=outer as u64)
            .map(|i| Duration::from_nanos(1_000 + (i * 7919) % 513))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(outer), &series, |b, series| {
            b.iter(|| compute_stats(series, outer, StatsMode::Reference).unwrap());
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let src: Vec<f64> = (0..1 << 16).map(f64::from).collect();
    let mut packed = Vec::with_capacity(1 << 15);
    c.bench_function("layout_gather_strided", |b| {
        let layout = Layout::new(1 << 12, 8, 16);
        b.iter(|| {
            layout.gather(black_box(&src), &mut packed);
            black_box(packed.len())
        });
    });
}

fn bench_team_barrier(c: &mut Criterion) {
    let team = ThreadTeam::new(2).unwrap();
    c.bench_function("team_1000_barriers", |b| {
        b.iter(|| {
            team.run(|image| {
                for _ in 0..1000 {
                    image.sync_all();
                }
            })
        });
    });
}

criterion_group!(benches, bench_controller, bench_stats, bench_layout, bench_team_barrier);
criterion_main!(benches);
