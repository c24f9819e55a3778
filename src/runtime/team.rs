//! In-process PGAS runtime: one scoped thread per image.
//!
//! Segments of a symmetric array live behind one `RwLock` per image, so a
//! put or get completes (and is visible) as soon as the call returns.
//! `sync images` is built on a matrix of per-pair counters: image `i`
//! bumps `sent[i][j]` and waits until `sent[j][i]` has caught up.
//!
//! When one image panics the team is poisoned: every image blocked in a
//! barrier or in `sync images` unwinds too, and [`ThreadTeam::run`]
//! re-raises the first real panic.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use crate::error::{Error, Result};

use super::layout::Layout;
use super::{Runtime, SymmetricArray};

type Segments = Vec<RwLock<Vec<f64>>>;

/// Team of images running a closure in parallel.
#[derive(Debug, Clone, Copy)]
pub struct ThreadTeam {
    num_images: usize,
}

impl ThreadTeam {
    /// Team of `num_images` images.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when `num_images` is zero.
    pub fn new(num_images: usize) -> Result<Self> {
        if num_images == 0 {
            return Err(Error::config("a team needs at least one image"));
        }
        Ok(Self { num_images })
    }

    /// Number of images.
    pub fn num_images(&self) -> usize {
        self.num_images
    }

    /// Run `f` on every image and collect the results in image order.
    ///
    /// A panic on any image poisons the team, so images waiting on it
    /// unwind instead of blocking. Once all threads have stopped, the first
    /// image's own panic is re-raised here.
    pub fn run<F, R>(&self, f: F) -> Vec<R>
    where
        F: Fn(&Image<'_>) -> R + Sync,
        R: Send,
    {
        let shared = Shared::new(self.num_images);

        let outcomes: Vec<std::thread::Result<R>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.num_images)
                .map(|me| {
                    let shared = &shared;
                    let f = &f;
                    scope.spawn(move || {
                        let _guard = PoisonOnUnwind(shared);
                        f(&Image { me, shared })
                    })
                })
                .collect();

            handles.into_iter().map(|handle| handle.join()).collect()
        });

        let mut values = Vec::with_capacity(outcomes.len());
        let mut first: Option<Box<dyn Any + Send>> = None;
        for outcome in outcomes {
            match outcome {
                Ok(value) => values.push(value),
                Err(payload) => {
                    let aborted = payload.is::<TeamAborted>();
                    if first.as_ref().map_or(true, |p| p.is::<TeamAborted>() && !aborted) {
                        first = Some(payload);
                    }
                }
            }
        }
        if let Some(payload) = first {
            std::panic::resume_unwind(payload);
        }
        values
    }
}

/// Unwind payload of an image that stopped because another image panicked.
struct TeamAborted;

fn abort_image() -> ! {
    std::panic::resume_unwind(Box::new(TeamAborted))
}

/// Poisons the team if the image unwinds.
struct PoisonOnUnwind<'a>(&'a Shared);

impl Drop for PoisonOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.poison();
        }
    }
}

/// Reusable barrier that releases its waiters when the team is poisoned.
struct TeamBarrier {
    num_images: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

#[derive(Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
}

impl TeamBarrier {
    fn new(num_images: usize) -> Self {
        Self {
            num_images,
            state: Mutex::new(BarrierState::default()),
            released: Condvar::new(),
        }
    }

    fn wait(&self, poisoned: &AtomicBool) {
        let mut state = acquire(&self.state);
        if poisoned.load(Ordering::Acquire) {
            drop(state);
            abort_image();
        }

        state.arrived += 1;
        if state.arrived == self.num_images {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return;
        }

        let generation = state.generation;
        while state.generation == generation {
            if poisoned.load(Ordering::Acquire) {
                drop(state);
                abort_image();
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release_all(&self) {
        // Taking the lock orders the flag store before any waiter's next check.
        let _state = acquire(&self.state);
        self.released.notify_all();
    }
}

struct Shared {
    num_images: usize,
    barrier: TeamBarrier,
    poisoned: AtomicBool,
    sent: Vec<AtomicU64>,
    slots: Vec<AtomicU64>,
    critical: Mutex<()>,
    locks: Vec<Mutex<()>>,
    pending: Mutex<Arc<Segments>>,
}

impl Shared {
    fn new(num_images: usize) -> Self {
        Self {
            num_images,
            barrier: TeamBarrier::new(num_images),
            poisoned: AtomicBool::new(false),
            sent: (0..num_images * num_images).map(|_| AtomicU64::new(0)).collect(),
            slots: (0..num_images).map(|_| AtomicU64::new(0)).collect(),
            critical: Mutex::new(()),
            locks: (0..num_images).map(|_| Mutex::new(())).collect(),
            pending: Mutex::new(Arc::new(Vec::new())),
        }
    }

    fn sent(&self, from: usize, to: usize) -> &AtomicU64 {
        &self.sent[from * self.num_images + to]
    }

    fn wait_all(&self) {
        self.barrier.wait(&self.poisoned);
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::Release);
        self.barrier.release_all();
    }
}

/// Handle of one image inside [`ThreadTeam::run`].
pub struct Image<'a> {
    me: usize,
    shared: &'a Shared,
}

impl Image<'_> {
    /// Publish `value` in this image's slot, then read every slot.
    fn exchange(&self, value: u64) -> Vec<u64> {
        self.shared.slots[self.me].store(value, Ordering::Release);
        self.shared.wait_all();
        let values = self
            .shared
            .slots
            .iter()
            .map(|slot| slot.load(Ordering::Acquire))
            .collect();
        // Nobody may overwrite a slot before every image has read it.
        self.shared.wait_all();
        values
    }
}

impl Runtime for Image<'_> {
    type Array = TeamArray;

    fn this_image(&self) -> usize {
        self.me
    }

    fn num_images(&self) -> usize {
        self.shared.num_images
    }

    fn sync_all(&self) {
        self.shared.wait_all();
    }

    fn sync_images(&self, images: &[usize]) {
        for &other in images {
            self.shared.sent(self.me, other).fetch_add(1, Ordering::AcqRel);
        }
        for &other in images {
            let posted = self.shared.sent(self.me, other).load(Ordering::Acquire);
            while self.shared.sent(other, self.me).load(Ordering::Acquire) < posted {
                if self.shared.poisoned.load(Ordering::Acquire) {
                    abort_image();
                }
                std::thread::yield_now();
            }
        }
    }

    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = acquire(&self.shared.critical);
        f()
    }

    fn lock<R>(&self, image: usize, f: impl FnOnce() -> R) -> R {
        let _guard = acquire(&self.shared.locks[image]);
        f()
    }

    fn reduce_max(&self, value: u64) -> u64 {
        self.exchange(value).into_iter().max().unwrap_or(value)
    }

    fn all_true(&self, value: bool) -> bool {
        self.exchange(u64::from(value)).into_iter().all(|v| v == 1)
    }

    fn broadcast(&self, value: u64, root: usize) -> u64 {
        self.exchange(value)[root]
    }

    fn allocate(&self, len: usize) -> TeamArray {
        self.shared.wait_all();
        if self.me == 0 {
            let segments: Segments = (0..self.shared.num_images)
                .map(|_| RwLock::new(vec![0.0; len]))
                .collect();
            *acquire(&self.shared.pending) = Arc::new(segments);
        }
        self.shared.wait_all();

        // Image 0 has published; nobody republishes before the next allocate's first barrier.
        let segments = Arc::clone(&acquire(&self.shared.pending));

        TeamArray {
            segments,
            me: self.me,
            len,
        }
    }
}

/// Symmetric array allocated by a [`ThreadTeam`] image.
#[derive(Debug, Clone)]
pub struct TeamArray {
    segments: Arc<Segments>,
    me: usize,
    len: usize,
}

impl SymmetricArray for TeamArray {
    fn len(&self) -> usize {
        self.len
    }

    fn with_local<R>(&self, f: impl FnOnce(&[f64]) -> R) -> R {
        let segment = self.segments[self.me]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&segment)
    }

    fn with_local_mut<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R {
        let mut segment = self.segments[self.me]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut segment)
    }

    fn put(&self, image: usize, layout: &Layout, packed: &[f64]) {
        let mut segment = self.segments[image]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        layout.scatter(packed, &mut segment);
    }

    fn get(&self, image: usize, layout: &Layout, out: &mut Vec<f64>) {
        let segment = self.segments[image]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        layout.gather(&segment, out);
    }
}

fn acquire<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
