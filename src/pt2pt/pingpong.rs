use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::measurement::{nanos, RepetitionController, Timer, Trial};
use crate::result::{PingPongReport, PingPongRow};
use crate::runtime::{Layout, Runtime, SymmetricArray};
use crate::statistics::{compute_stats, TimeSeries};

use super::{Direction, Granularity, Mode, SyncMode};

/// How images are paired for a ping-pong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pairing {
    /// The first image with the last; every other image idles.
    Single,
    /// Image `i` with image `i + n/2`, all pairs at once.
    Multi,
    /// As `Multi`, with sender and receiver swapped on even images.
    Cross,
}

impl Pairing {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Pairing::Single => "single",
            Pairing::Multi => "multiple",
            Pairing::Cross => "crossing",
        }
    }

    /// `(image1, image2)` for the pair `me` belongs to, or `None` when the
    /// pairing does not fit `n` images.
    ///
    /// Under `Single`, images outside the pair still get the pair so they can
    /// take part in collective synchronisation.
    pub fn images(self, me: usize, n: usize) -> Option<(usize, usize)> {
        match self {
            Pairing::Single => Some((0, n.checked_sub(1)?)),
            Pairing::Multi => {
                if n <= 2 || n % 2 != 0 {
                    return None;
                }
                let half = n / 2;
                Some(if me < half { (me, me + half) } else { (me - half, me) })
            }
            Pairing::Cross => {
                if n % 4 != 0 {
                    return None;
                }
                let (image1, image2) = Pairing::Multi.images(me, n)?;
                Some(if me % 2 == 0 { (image2, image1) } else { (image1, image2) })
            }
        }
    }
}

/// One pair's view of a ping-pong.
#[derive(Debug, Clone, Copy)]
pub struct PingPong {
    /// Image that starts each round trip.
    pub image1: usize,
    /// Image that answers.
    pub image2: usize,
    /// Transfer variant.
    pub mode: Mode,
    /// Synchronisation between ping and pong.
    pub sync: SyncMode,
    /// Verify data on every round trip.
    pub check: bool,
}

impl PingPong {
    fn partner(&self, me: usize) -> Option<usize> {
        if me == self.image1 {
            Some(self.image2)
        } else if me == self.image2 {
            Some(self.image1)
        } else {
            None
        }
    }

    fn sync<R: Runtime>(&self, rt: &R) {
        match self.sync {
            SyncMode::All => rt.sync_all(),
            SyncMode::Pt2pt => {
                if let Some(partner) = self.partner(rt.this_image()) {
                    rt.sync_images(&[partner]);
                }
            }
        }
    }

    /// Push this image's section to `target`.
    fn send<A: SymmetricArray>(&self, x: &A, target: usize, layout: &Layout, scratch: &mut Vec<f64>) {
        match self.mode.granularity() {
            Granularity::Whole => {
                x.with_local(|local| layout.gather(local, scratch));
                x.put(target, layout, scratch);
            }
            Granularity::PerBlock => {
                for i in 0..layout.count {
                    let block = layout.block(i);
                    x.with_local(|local| block.gather(local, scratch));
                    x.put(target, &block, scratch);
                }
            }
            Granularity::PerElement => {
                for index in layout.indices() {
                    let value = x.with_local(|local| local[index]);
                    x.put(target, &Layout::element(index), &[value]);
                }
            }
        }
    }

    /// Pull `source`'s section into this image's segment.
    fn fetch<A: SymmetricArray>(&self, x: &A, source: usize, layout: &Layout, scratch: &mut Vec<f64>) {
        match self.mode.granularity() {
            Granularity::Whole => {
                x.get(source, layout, scratch);
                x.with_local_mut(|local| layout.scatter(scratch, local));
            }
            Granularity::PerBlock => {
                for i in 0..layout.count {
                    let block = layout.block(i);
                    x.get(source, &block, scratch);
                    x.with_local_mut(|local| block.scatter(scratch, local));
                }
            }
            Granularity::PerElement => {
                for index in layout.indices() {
                    let element = Layout::element(index);
                    x.get(source, &element, scratch);
                    x.with_local_mut(|local| element.scatter(scratch, local));
                }
            }
        }
    }

    fn set<A: SymmetricArray>(&self, x: &A, layout: &Layout, value: f64) {
        if self.check {
            x.with_local_mut(|local| layout.fill(local, value));
        }
    }

    fn verify<A: SymmetricArray>(&self, x: &A, layout: &Layout, value: f64) -> bool {
        !self.check || x.with_local(|local| layout.verify(local, value))
    }

    /// One round trip. Returns `false` if this image saw wrong data.
    fn round_trip<R: Runtime>(
        &self,
        rt: &R,
        x: &R::Array,
        layout: &Layout,
        irep: usize,
        scratch: &mut Vec<f64>,
    ) -> bool {
        let me = rt.this_image();
        let value = (irep + 1) as f64;
        let mut ok = true;

        match self.mode.direction() {
            Direction::Put => {
                if me == self.image1 {
                    self.set(x, layout, value);
                    self.send(x, self.image2, layout, scratch);
                }
                self.sync(rt);
                if me == self.image2 {
                    ok &= self.verify(x, layout, value);
                    self.set(x, layout, -value);
                    self.send(x, self.image1, layout, scratch);
                }
                self.sync(rt);
                if me == self.image1 {
                    ok &= self.verify(x, layout, -value);
                }
            }
            Direction::Get => {
                if me == self.image1 {
                    self.set(x, layout, value);
                }
                self.sync(rt);
                if me == self.image2 {
                    self.fetch(x, self.image1, layout, scratch);
                    ok &= self.verify(x, layout, value);
                    self.set(x, layout, -value);
                }
                self.sync(rt);
                if me == self.image1 {
                    self.fetch(x, self.image2, layout, scratch);
                    ok &= self.verify(x, layout, -value);
                }
            }
        }

        ok
    }

    /// Time `nrep` round trips on every image.
    ///
    /// Returns the slowest image's elapsed time and whether every image saw
    /// correct data.
    fn trial<R: Runtime>(&self, rt: &R, x: &R::Array, layout: &Layout, nrep: usize) -> (Trial, bool) {
        let me = rt.this_image();
        let mut scratch = Vec::with_capacity(layout.ndata());

        x.fill_local(0.0);
        if me == self.image1 {
            x.with_local_mut(|local| layout.fill(local, 1.0));
        }
        rt.sync_all();

        let mut ok = true;
        let local = Timer::time_block(nrep, |irep| {
            ok &= self.round_trip(rt, x, layout, irep, &mut scratch);
        });

        let elapsed = Duration::from_nanos(rt.reduce_max(nanos(local.elapsed)));
        let ok = rt.all_true(ok);
        (Trial::new(nrep, elapsed), ok)
    }

    /// Measure one section size. `None` when verification failed.
    fn measure<R: Runtime>(
        &self,
        rt: &R,
        x: &R::Array,
        layout: &Layout,
        controller: &mut RepetitionController,
        config: &Config,
    ) -> Result<Option<PingPongRow>> {
        let outer_reps = config.p2p.outer_reps;
        let mut series = TimeSeries::with_outer_reps(outer_reps);
        let mut nrep = controller.nrep();

        while series.len() < outer_reps + 1 {
            let (trial, ok) = self.trial(rt, x, layout, controller.nrep());
            if !ok {
                return Ok(None);
            }
            if controller.check(trial.elapsed) {
                nrep = trial.repetitions;
                series.push(trial.per_repetition());
            }
        }

        let stats = compute_stats(&series, outer_reps, config.stats_mode)?;
        Ok(Some(PingPongRow::new(layout, nrep, &stats)))
    }
}

/// Run one mode's full size sweep between `image1` and `image2`.
///
/// Collective: every image calls it with the same mode and sync and its own
/// pair, and gets the same rows back.
///
/// # Errors
///
/// `InvalidConfiguration` for a zero target time or repetition ceiling, or
/// fewer than 2 outer repetitions.
pub fn pingpong<R: Runtime>(rt: &R, config: &Config, pingpong: PingPong, pairing: Pairing) -> Result<PingPongReport> {
    let p2p = &config.p2p;
    let mode = pingpong.mode;
    let mut controller =
        RepetitionController::new(p2p.target_time, 1)?.with_ceiling(config.max_repetitions)?;

    let layouts = mode.pattern().sweep(p2p.max_elements, p2p.max_stride);
    let mut x = rt.allocate(if mode.reallocates() { 0 } else { p2p.max_elements });

    let mut report = PingPongReport {
        pairing,
        mode,
        sync: pingpong.sync,
        image1: pingpong.image1,
        image2: pingpong.image2,
        checked: pingpong.check,
        verified: true,
        rows: Vec::with_capacity(layouts.len()),
    };

    for layout in &layouts {
        if mode.reallocates() {
            x = rt.allocate(layout.ndata());
        }
        match pingpong.measure(rt, &x, layout, &mut controller, config)? {
            Some(row) => {
                debug!(mode = mode.name(), ndata = row.ndata, nrep = row.nrep, time_us = row.time_us, "size done");
                report.rows.push(row);
            }
            None => {
                if rt.this_image() == 0 {
                    error!(mode = mode.name(), ndata = layout.ndata(), "transferred data failed verification");
                }
                report.verified = false;
                break;
            }
        }
    }

    Ok(report)
}

/// Run every enabled pairing, sync mode and transfer mode.
///
/// Collective over all images of `rt`.
///
/// # Errors
///
/// `InvalidConfiguration` when `config` does not validate.
pub fn run<R: Runtime>(rt: &R, config: &Config) -> Result<Vec<PingPongReport>> {
    config.validate()?;
    let p2p = &config.p2p;
    let me = rt.this_image();
    let n = rt.num_images();
    let mut reports = Vec::new();

    let pairings = [
        (Pairing::Single, p2p.single),
        (Pairing::Multi, p2p.multi),
        (Pairing::Cross, p2p.cross),
    ];

    for (pairing, enabled) in pairings {
        if !enabled {
            continue;
        }
        let Some((image1, image2)) = pairing.images(me, n) else {
            if me == 0 {
                warn!(pairing = pairing.name(), images = n, "pairing does not fit the image count, skipping");
            }
            continue;
        };
        if me == 0 {
            info!(pairing = pairing.name(), image1, image2, "starting ping-pong");
        }

        for &sync in &p2p.syncs {
            for &mode in &p2p.modes {
                if me == 0 {
                    info!(mode = mode.name(), sync = sync.name(), "benchmarking");
                }
                let pp = PingPong {
                    image1,
                    image2,
                    mode,
                    sync,
                    check: p2p.check,
                };
                reports.push(pingpong(rt, config, pp, pairing)?);
            }
        }
    }

    Ok(reports)
}
