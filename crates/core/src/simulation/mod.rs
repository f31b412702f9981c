//! Water simulation facade
//!
//! `WaterSimulation` owns whichever model the configuration selects and
//! exposes the painting and query operations a front end needs. The model
//! is held in a plain enum, so every call is a static match.

pub mod config;

pub use config::{Model, SimulationConfig};

use crate::error::SimError;
use crate::grid::{Field, GridPos, GridSize, Vec2, WaterCell};
use crate::solver::{
    FallingModel, FrameTimer, ParallelScheduler, PressureModel, ProfilerScope, WaterSolver,
};
use tracing::{info, warn};

enum Engine {
    Falling(FallingModel),
    Pressure(PressureModel),
    PressureVelocity(ParallelScheduler),
}

/// Run `$body` with `$solver` bound to the active model
macro_rules! with_engine {
    ($engine:expr, $solver:ident => $body:expr) => {
        match $engine {
            Engine::Falling($solver) => $body,
            Engine::Pressure($solver) => $body,
            Engine::PressureVelocity($solver) => $body,
        }
    };
}

/// A running water simulation
pub struct WaterSimulation {
    engine: Engine,
    config: SimulationConfig,
    ticks: u64,
    timer: FrameTimer,
    stopped: bool,
}

impl WaterSimulation {
    /// Create a dry `width` x `height` grid with the default configuration
    ///
    /// # Errors
    ///
    /// Fails when either dimension is zero or the grid is too large to address.
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        Self::with_config(width, height, SimulationConfig::default())
    }

    /// Create a dry `width` x `height` grid
    ///
    /// # Arguments
    ///
    /// * `width` - Columns
    /// * `height` - Rows
    /// * `config` - Model, threading and flow tuning
    ///
    /// # Errors
    ///
    /// Fails on invalid dimensions, invalid configuration, or when worker
    /// threads cannot be started.
    pub fn with_config(
        width: usize,
        height: usize,
        config: SimulationConfig,
    ) -> Result<Self, SimError> {
        let size = GridSize::new(width, height);
        size.validate()?;
        config.validate()?;

        info!(
            "Creating {} water simulation: {}x{} grid",
            config.model.name(),
            width,
            height
        );

        let engine = match config.model {
            Model::Falling => Engine::Falling(FallingModel::new(size, config.seed)?),
            Model::Pressure => Engine::Pressure(PressureModel::new(size, config.params)?),
            Model::PressureVelocity => Engine::PressureVelocity(ParallelScheduler::new(
                size,
                config.params,
                config.dispatch,
                config.threads,
                config.seed,
            )?),
        };

        Ok(Self {
            engine,
            config,
            ticks: 0,
            timer: FrameTimer::new(),
            stopped: false,
        })
    }

    /// Configuration the simulation was built with
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Grid dimensions
    pub fn size(&self) -> GridSize {
        with_engine!(&self.engine, solver => solver.size())
    }

    /// Paint (`true`) or remove (`false`) water; off-grid positions are ignored
    pub fn set_water(&mut self, pos: GridPos, present: bool) {
        with_engine!(&mut self.engine, solver => solver.set_water(pos, present));
    }

    /// Mark or unmark a wall; off-grid positions are ignored
    pub fn set_boundary(&mut self, pos: GridPos, present: bool) {
        with_engine!(&mut self.engine, solver => solver.set_boundary(pos, present));
    }

    /// Overwrite one cell's pressure
    pub fn set_cell_pressure(&mut self, pos: GridPos, value: f32) {
        with_engine!(&mut self.engine, solver => solver.set_pressure(pos, value));
    }

    /// Overwrite one cell's velocity (ignored by models without velocity)
    pub fn set_cell_velocity(&mut self, pos: GridPos, value: Vec2) {
        with_engine!(&mut self.engine, solver => solver.set_velocity(pos, value));
    }

    /// Advance one tick
    ///
    /// Does nothing (apart from a warning) after `shutdown`.
    pub fn step(&mut self) {
        if self.stopped {
            warn!("Step called after shutdown, ignoring");
            return;
        }
        let scope = ProfilerScope::new("simulation_step");
        with_engine!(&mut self.engine, solver => solver.step());
        self.ticks += 1;
        self.timer.record(scope.elapsed_ms());
    }

    /// Copy of one cell, `None` off the grid
    pub fn cell(&self, pos: GridPos) -> Option<WaterCell> {
        with_engine!(&self.engine, solver => solver.cell(pos))
    }

    /// Owned snapshot of every cell's pressure
    pub fn pressure_field(&self) -> Field<f32> {
        with_engine!(&self.engine, solver => solver.pressure_field())
    }

    /// Owned snapshot of the boundary mask
    pub fn boundary_field(&self) -> Field<bool> {
        with_engine!(&self.engine, solver => solver.boundary_field())
    }

    /// Total water on the grid
    pub fn total_pressure(&self) -> f32 {
        with_engine!(&self.engine, solver => solver.total_pressure())
    }

    /// Ticks completed
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Threads doing the work (1 for the serial models)
    pub fn worker_count(&self) -> usize {
        match &self.engine {
            Engine::PressureVelocity(scheduler) => scheduler.worker_count(),
            Engine::Falling(_) | Engine::Pressure(_) => 1,
        }
    }

    /// Duration of the most recent tick
    pub fn last_tick_ms(&self) -> f64 {
        self.timer.last_frame_time_ms()
    }

    /// Mean tick duration so far
    pub fn average_tick_ms(&self) -> f64 {
        self.timer.average_frame_time_ms()
    }

    /// Whether `shutdown` has run
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stop and join any worker threads
    ///
    /// Idempotent. Queries keep working afterwards; `step` does not.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        with_engine!(&mut self.engine, solver => solver.shutdown());
        info!(
            "Water simulation stopped after {} ticks (avg {:.3}ms/tick)",
            self.ticks,
            self.timer.average_frame_time_ms()
        );
    }
}

impl Drop for WaterSimulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
