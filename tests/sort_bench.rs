//! Shared-memory sort benchmark.

use cafbench::sort::{self, checksum, first_unordered, generate, KeyDistribution, SortBackend};
use cafbench::{Config, Error};

fn small_config(distribution: KeyDistribution) -> Config {
    let mut config = Config::quick();
    config.p2p.enabled = false;
    config.sync.enabled = false;
    config.sort.enabled = true;
    config.sort.elements = 50_000;
    config.sort.iterations = 3;
    config.sort.threads = Some(2);
    config.sort.distribution = distribution;
    config.seed = Some(2024);
    config
}

#[test]
fn every_backend_and_distribution() {
    let distributions = [
        KeyDistribution::Uniform,
        KeyDistribution::Normal,
        KeyDistribution::Sorted,
        KeyDistribution::Reverse,
        KeyDistribution::PartialSorted,
    ];
    for distribution in distributions {
        let mut config = small_config(distribution);
        config.sort.backends = vec![
            SortBackend::ParallelUnstable,
            SortBackend::ParallelStable,
            SortBackend::Sequential,
        ];
        let reports = sort::run(&config).unwrap();
        assert_eq!(reports.len(), 3);
        for report in reports {
            assert_eq!(report.distribution, distribution);
            assert_eq!(report.threads, 2);
            assert_eq!(report.elements, 50_000);
            assert_eq!(report.times.len(), 4);
            assert!(report.stats.outliers <= 3);
        }
    }
}

#[test]
fn megabytes_of_keys() {
    let mut config = small_config(KeyDistribution::Sorted);
    config.sort.elements = 1 << 17;
    config.sort.backends = vec![SortBackend::Sequential];
    let reports = sort::run(&config).unwrap();
    assert_eq!(reports[0].megabytes, 1.0);
}

#[test]
fn too_few_iterations_rejected() {
    let mut config = small_config(KeyDistribution::Uniform);
    config.sort.iterations = 1;
    assert!(matches!(sort::run(&config), Err(Error::InvalidConfiguration(_))));
}

#[test]
fn generation_independent_of_thread_count() {
    let mut narrow = vec![0i64; 300_000];
    let mut wide = vec![0i64; 300_000];
    rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| generate(&mut narrow, KeyDistribution::Uniform, 9));
    rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(|| generate(&mut wide, KeyDistribution::Uniform, 9));
    assert_eq!(narrow, wide);
}

#[test]
fn verification_helpers() {
    let mut keys = vec![0i64; 10_000];
    generate(&mut keys, KeyDistribution::Normal, 4);
    let sum = checksum(&keys);
    keys.sort_unstable();
    assert_eq!(checksum(&keys), sum);
    assert_eq!(first_unordered(&keys), None);

    keys.swap(10, 9_990);
    assert!(first_unordered(&keys).is_some());
}
