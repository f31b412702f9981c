//! Pressure + velocity model on banded worker threads
//!
//! The grid is split into contiguous column bands, one per worker. Every
//! tick runs two phases separated by a hard barrier:
//!
//! 1. velocities: drag, gravity, pressure push and direction sampling
//! 2. move fluid: push-only transfers into the next buffer
//!
//! Between the phases the driving thread copies each band's current buffer
//! into its next buffer. After the second phase it folds cross-band inflows
//! into their owners, commits, restores the cell invariants and refreshes
//! the pressure mirror that workers read across band edges.

use super::band::Band;
use super::lock_set::CellLockSet;
use super::params::FlowParams;
use super::profiler::ProfilerScope;
use super::r#trait::{sanitize_pressure, WaterSolver};
use super::settle::settle;
use super::view::GridView;
use crate::error::SimError;
use crate::grid::{Field, GridPos, GridSize, Vec2, WaterCell};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{
    Arc, Barrier, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// How band work is handed to threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dispatch {
    /// Persistent threads, one per band, released by a two-phase barrier
    #[default]
    WorkerPool,
    /// One rayon task per band, joined after each phase
    ForkJoin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Velocities,
    MoveFluid,
    Stop,
}

// Every value behind these locks is plain numeric data, still valid after
// a panic elsewhere
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the driving thread and the workers
struct SharedState {
    bands: Vec<Mutex<Band>>,
    /// Whole-grid copy of current pressure, only written between ticks
    pressure: RwLock<Field<f32>>,
    boundaries: RwLock<Field<bool>>,
    locks: CellLockSet,
    params: FlowParams,
}

impl SharedState {
    fn run_phase(&self, band: usize, phase: Phase) {
        let pressure = read(&self.pressure);
        let boundaries = read(&self.boundaries);
        let view = GridView::new(&pressure, &boundaries);
        let mut band = lock(&self.bands[band]);

        match phase {
            Phase::Velocities => band.integrate_velocities(&view, &self.params),
            Phase::MoveFluid => band.push_fluid(&view, &self.locks, &self.params),
            Phase::Stop => {}
        }
    }
}

/// Phase handoff between the driver and the pool
struct PhaseSignal {
    phase: Mutex<Phase>,
    /// Releases the workers into `phase`
    start: Barrier,
    /// Passed once every worker finished `phase`
    done: Barrier,
}

struct WorkerPool {
    signal: Arc<PhaseSignal>,
    handles: Vec<JoinHandle<()>>,
}

impl PhaseSignal {
    fn new(workers: usize) -> Self {
        Self {
            phase: Mutex::new(Phase::Stop),
            start: Barrier::new(workers + 1),
            done: Barrier::new(workers + 1),
        }
    }

    /// Run `phase` on every worker and wait for all of them
    fn run(&self, phase: Phase) {
        *lock(&self.phase) = phase;
        self.start.wait();
        self.done.wait();
    }

    /// Release the workers one last time so they exit
    fn stop(&self) {
        *lock(&self.phase) = Phase::Stop;
        self.start.wait();
    }
}

impl WorkerPool {
    fn spawn(shared: &Arc<SharedState>) -> Result<Self, SimError> {
        let workers = shared.bands.len();
        let signal = Arc::new(PhaseSignal::new(workers));

        // Workers wait for a go-ahead so a failed spawn can release the
        // ones already running without touching the barriers
        let mut handles = Vec::with_capacity(workers);
        let mut go = Vec::with_capacity(workers);
        for index in 0..workers {
            let (tx, rx) = mpsc::channel::<()>();
            let shared = Arc::clone(shared);
            let signal = Arc::clone(&signal);
            let spawned = thread::Builder::new()
                .name(format!("water-worker-{index}"))
                .spawn(move || {
                    if rx.recv().is_ok() {
                        worker_loop(index, &signal, |phase| shared.run_phase(index, phase));
                    }
                });

            match spawned {
                Ok(handle) => {
                    handles.push(handle);
                    go.push(tx);
                }
                Err(e) => {
                    drop(go);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SimError::WorkerSpawn {
                        reason: e.to_string(),
                    });
                }
            }
        }

        for tx in go {
            // A worker only hangs up by exiting, which cannot happen before
            // it receives this
            let _ = tx.send(());
        }

        Ok(Self { signal, handles })
    }

    fn run(&self, phase: Phase) {
        self.signal.run(phase);
    }

    fn stop(&mut self) {
        self.signal.stop();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Water worker exited abnormally");
            }
        }
    }
}

/// Wait for phases until told to stop
///
/// A panic inside `run_phase` is logged and the worker still reaches the
/// `done` barrier, so the driver never waits on a dead thread. The band it
/// was working on keeps whatever state the panic left behind.
fn worker_loop(index: usize, signal: &PhaseSignal, mut run_phase: impl FnMut(Phase)) {
    debug!("Water worker {} started", index);
    loop {
        signal.start.wait();
        let phase = *lock(&signal.phase);
        if phase == Phase::Stop {
            break;
        }
        if panic::catch_unwind(AssertUnwindSafe(|| run_phase(phase))).is_err() {
            error!("Water worker {} panicked during {:?}", index, phase);
        }
        signal.done.wait();
    }
    debug!("Water worker {} stopped", index);
}

enum Dispatcher {
    Pool(WorkerPool),
    ForkJoin,
}

/// Multi-threaded pressure + velocity water simulation
pub struct ParallelScheduler {
    size: GridSize,
    params: FlowParams,
    shared: Arc<SharedState>,
    dispatcher: Dispatcher,
    band_width: usize,
    stopped: bool,
}

impl ParallelScheduler {
    /// Build the bands and start the workers
    ///
    /// # Arguments
    ///
    /// * `size` - Grid dimensions
    /// * `params` - Flow tuning
    /// * `dispatch` - How band work reaches threads
    /// * `threads` - Requested workers; `None` uses the hardware concurrency
    /// * `seed` - Base seed for the per-band random streams
    ///
    /// The actual worker count is capped at one per three columns.
    ///
    /// # Errors
    ///
    /// Fails on invalid dimensions or parameters, a zero thread count, or
    /// when a worker thread cannot be spawned.
    pub fn new(
        size: GridSize,
        params: FlowParams,
        dispatch: Dispatch,
        threads: Option<usize>,
        seed: u64,
    ) -> Result<Self, SimError> {
        size.validate()?;
        params.validate()?;
        if threads == Some(0) {
            return Err(SimError::InvalidThreadCount);
        }

        let requested = threads.unwrap_or_else(|| {
            thread::available_parallelism().map_or(1, NonZeroUsize::get)
        });
        let workers = requested.min(size.width / 3).max(1);
        let band_width = size.width / workers;

        let bands = (0..workers)
            .map(|i| {
                let start = i * band_width;
                let end = if i + 1 == workers {
                    size.width
                } else {
                    start + band_width
                };
                Mutex::new(Band::new(i, start..end, size.height, seed))
            })
            .collect();

        let shared = Arc::new(SharedState {
            bands,
            pressure: RwLock::new(Field::with_value(size, 0.0)),
            boundaries: RwLock::new(Field::with_value(size, false)),
            locks: CellLockSet::new(size),
            params,
        });

        let dispatcher = match dispatch {
            Dispatch::WorkerPool => Dispatcher::Pool(WorkerPool::spawn(&shared)?),
            Dispatch::ForkJoin => Dispatcher::ForkJoin,
        };

        info!(
            "Water scheduler ready: {}x{} grid, {} workers ({:?}), band width {}",
            size.width, size.height, workers, dispatch, band_width
        );

        Ok(Self {
            size,
            params,
            shared,
            dispatcher,
            band_width,
            stopped: false,
        })
    }

    /// Number of worker bands
    pub fn worker_count(&self) -> usize {
        self.shared.bands.len()
    }

    /// Whether `shutdown` has run
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn run(&self, phase: Phase) {
        match &self.dispatcher {
            Dispatcher::Pool(pool) => pool.run(phase),
            Dispatcher::ForkJoin => {
                let shared = &*self.shared;
                (0..shared.bands.len())
                    .into_par_iter()
                    .for_each(|band| shared.run_phase(band, phase));
            }
        }
    }

    fn band_of(&self, x: usize) -> usize {
        (x / self.band_width).min(self.shared.bands.len() - 1)
    }

    /// Apply `edit` to the cell at `pos` and mirror its pressure
    fn edit_cell(&mut self, pos: GridPos, edit: impl FnOnce(&mut WaterCell, &mut bool)) {
        let Some((x, y)) = self.size.cell(pos) else {
            return;
        };
        let shared = &*self.shared;
        let mut band = lock(&shared.bands[self.band_of(x)]);
        let mut boundaries = write(&shared.boundaries);

        let cell = band.cells.cell_mut(x, y);
        let mut boundary = boundaries.get(x, y);
        edit(cell, &mut boundary);
        if boundary {
            cell.clear();
        }
        boundaries.set(x, y, boundary);
        write(&shared.pressure).set(x, y, cell.pressure);
    }

    /// Fold inflows, commit, settle and refresh the pressure mirror
    fn finish_tick(&self) {
        let shared = &*self.shared;
        let boundaries = read(&shared.boundaries);
        let mut pressure = write(&shared.pressure);

        let mut merged = 0;
        for band in &shared.bands {
            let mut band = lock(band);
            for x in band.edge_columns() {
                merged += shared.locks.drain_column(x, &mut band.cells);
            }
            band.cells.commit();
            settle(&mut band.cells, &boundaries, self.params.min_pressure);

            for (x, y, cell) in band.cells.cells() {
                pressure.set(x, y, cell.pressure);
            }
        }
        trace!("Merged {} cross-band inflows", merged);
    }
}

impl WaterSolver for ParallelScheduler {
    fn size(&self) -> GridSize {
        self.size
    }

    fn set_water(&mut self, pos: GridPos, present: bool) {
        let full = self.params.max_pressure;
        self.edit_cell(pos, |cell, boundary| {
            if present {
                *boundary = false;
                cell.pressure = full;
            } else {
                cell.clear();
            }
        });
    }

    fn set_boundary(&mut self, pos: GridPos, present: bool) {
        self.edit_cell(pos, |_, boundary| *boundary = present);
    }

    fn set_pressure(&mut self, pos: GridPos, value: f32) {
        self.edit_cell(pos, |cell, _| cell.pressure = sanitize_pressure(value));
    }

    fn set_velocity(&mut self, pos: GridPos, value: Vec2) {
        self.edit_cell(pos, |cell, _| cell.velocity = value);
    }

    fn step(&mut self) {
        if self.stopped {
            warn!("Step called after shutdown, ignoring");
            return;
        }

        {
            let _scope = ProfilerScope::new("velocities");
            self.run(Phase::Velocities);
        }

        for band in &self.shared.bands {
            lock(band).cells.begin_transfers();
        }

        {
            let _scope = ProfilerScope::new("move_fluid");
            self.run(Phase::MoveFluid);
        }

        {
            let _scope = ProfilerScope::new("finish");
            self.finish_tick();
        }
    }

    fn cell(&self, pos: GridPos) -> Option<WaterCell> {
        let (x, y) = self.size.cell(pos)?;
        let band = lock(&self.shared.bands[self.band_of(x)]);
        Some(*band.cells.cell(x, y))
    }

    fn pressure_field(&self) -> Field<f32> {
        read(&self.shared.pressure).clone()
    }

    fn boundary_field(&self) -> Field<bool> {
        read(&self.shared.boundaries).clone()
    }

    fn total_pressure(&self) -> f32 {
        self.shared
            .bands
            .iter()
            .map(|band| lock(band).cells.total_pressure())
            .sum()
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Dispatcher::Pool(pool) = &mut self.dispatcher {
            pool.stop();
        }
        info!("Water scheduler shut down ({} workers)", self.shared.bands.len());
    }
}

impl Drop for ParallelScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scheduler(width: usize, height: usize, threads: usize) -> ParallelScheduler {
        ParallelScheduler::new(
            GridSize::new(width, height),
            FlowParams::default(),
            Dispatch::WorkerPool,
            Some(threads),
            42,
        )
        .unwrap()
    }

    #[test]
    fn test_worker_count_is_capped_by_width() {
        assert_eq!(scheduler(9, 4, 8).worker_count(), 3);
        assert_eq!(scheduler(2, 4, 8).worker_count(), 1);
        assert_eq!(scheduler(30, 4, 2).worker_count(), 2);
    }

    #[test]
    fn test_last_band_takes_remainder() {
        let sim = scheduler(10, 2, 3);
        let columns: Vec<_> = sim
            .shared
            .bands
            .iter()
            .map(|band| lock(band).columns())
            .collect();
        assert_eq!(columns, vec![0..3, 3..6, 6..10]);
        assert_eq!(sim.band_of(9), 2);
        assert_eq!(sim.band_of(5), 1);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = ParallelScheduler::new(
            GridSize::new(4, 4),
            FlowParams::default(),
            Dispatch::WorkerPool,
            Some(0),
            0,
        );
        assert!(matches!(result, Err(SimError::InvalidThreadCount)));
    }

    #[test]
    fn test_setters_update_mirror() {
        let mut sim = scheduler(9, 3, 3);
        sim.set_water(GridPos::new(4, 1), true);
        sim.set_pressure(GridPos::new(8, 2), 0.5);
        assert_relative_eq!(sim.pressure_field().get(4, 1), 1.0);
        assert_relative_eq!(sim.pressure_field().get(8, 2), 0.5);

        sim.set_boundary(GridPos::new(4, 1), true);
        assert_eq!(sim.pressure_field().get(4, 1), 0.0);
        assert!(sim.boundary_field().get(4, 1));

        sim.set_pressure(GridPos::new(0, 0), f32::NAN);
        assert_eq!(sim.pressure_field().get(0, 0), 0.0);
    }

    #[test]
    fn test_water_crosses_band_edges() {
        let mut sim = scheduler(9, 2, 3);
        for x in 0..3 {
            sim.set_water(GridPos::new(x, 1), true);
            sim.set_water(GridPos::new(x, 0), true);
        }
        let before = sim.total_pressure();
        for _ in 0..200 {
            sim.step();
        }

        assert_relative_eq!(sim.total_pressure(), before, epsilon = 1e-3);
        let field = sim.pressure_field();
        let beyond: f32 = field.cells().filter(|&(x, _, _)| x >= 3).map(|(_, _, p)| p).sum();
        assert!(beyond > 0.5, "only {beyond} reached the other bands");
    }

    #[test]
    fn test_step_after_shutdown_is_ignored() {
        let mut sim = scheduler(6, 3, 2);
        sim.set_water(GridPos::new(1, 2), true);
        sim.shutdown();
        sim.shutdown();
        let before = sim.pressure_field();
        sim.step();
        assert_eq!(sim.pressure_field(), before);
        assert!(sim.is_stopped());
    }

    #[test]
    fn test_panicking_phase_still_reaches_done_barrier() {
        let signal = Arc::new(PhaseSignal::new(1));
        let worker_signal = Arc::clone(&signal);
        let handle = thread::spawn(move || {
            let mut calls = 0;
            worker_loop(0, &worker_signal, |phase| {
                calls += 1;
                assert!(phase != Phase::Velocities, "velocity phase failed");
            });
            calls
        });

        // Both phases return to the driver even though the first one panics
        signal.run(Phase::Velocities);
        signal.run(Phase::MoveFluid);
        signal.stop();
        assert_eq!(handle.join().unwrap(), 2);
    }
}
