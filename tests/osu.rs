//! Fixed-iteration get and allocation latency.

use cafbench::osu::{self, sizes};
use cafbench::runtime::ThreadTeam;
use cafbench::{run_suite, Config, Error};

fn small_config() -> Config {
    let mut config = Config::quick();
    config.p2p.enabled = false;
    config.sync.enabled = false;
    config.sort.enabled = false;
    config.osu.max_elements = 64;
    config.osu.skip = 2;
    config.osu.loops = 20;
    config.osu.skip_large = 1;
    config.osu.loops_large = 5;
    config.osu.large_elements = 8;
    config
}

#[test]
fn get_latency_rows_agree_on_every_image() {
    let config = small_config();
    let team = ThreadTeam::new(3).unwrap();
    let views = team.run(|image| osu::get_latency(image, &config).unwrap());

    let expected = sizes(64);
    for view in &views {
        assert_eq!(view, &views[0]);
    }
    let rows = &views[0];
    assert_eq!(rows.iter().map(|r| r.elements).collect::<Vec<_>>(), expected);
    for row in rows {
        assert_eq!(row.bytes, row.elements * 8);
        assert!(row.latency_us >= 0.0);
        let loops = if row.elements > 8 { 5 } else { 20 };
        assert_eq!(row.iterations, loops, "{} elements", row.elements);
    }
}

#[test]
fn alloc_latency_uses_large_counts() {
    let config = small_config();
    let team = ThreadTeam::new(2).unwrap();
    let views = team.run(|image| osu::alloc_latency(image, &config).unwrap());

    assert_eq!(views[0], views[1]);
    assert_eq!(views[0].len(), sizes(64).len());
    assert!(views[0].iter().all(|row| row.iterations == 5));
}

#[test]
fn single_image_gets_from_itself() {
    let config = small_config();
    let team = ThreadTeam::new(1).unwrap();
    let views = team.run(|image| osu::run(image, &config).unwrap());
    let (get, alloc) = &views[0];
    assert_eq!(get.len(), alloc.len());
}

#[test]
fn zero_loops_rejected() {
    let mut config = small_config();
    config.osu.loops = 0;
    let team = ThreadTeam::new(2).unwrap();
    let results = team.run(|image| osu::get_latency(image, &config));
    assert!(results
        .into_iter()
        .all(|r| matches!(r, Err(Error::InvalidConfiguration(_)))));
}

#[test]
fn suite_reports_latency() {
    let report = run_suite(2, &small_config()).unwrap();
    assert_eq!(report.get_latency.len(), sizes(64).len());
    assert_eq!(report.alloc_latency.len(), sizes(64).len());
    assert!(report.pingpong.is_empty());
    assert!(report.sort.is_empty());
}
