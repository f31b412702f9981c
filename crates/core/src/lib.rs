//! Cellular water simulation core
//!
//! A 2D cellular automaton that moves water as per-cell pressure and
//! velocity. Cheap and visually plausible rather than physically exact,
//! and meant to be painted on interactively.
//!
//! The main model runs on a fixed pool of worker threads, each owning a
//! band of columns, with two barrier-separated phases per tick:
//!
//! 1. velocity integration and push-direction sampling
//! 2. push-only pressure transfers into a double buffer
//!
//! Two simpler models (pressure-only and discrete falling water) share the
//! same interface.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use water_sim_core::{GridPos, WaterSimulation};
//!
//! let mut sim = WaterSimulation::new(64, 48)?;
//! for x in 0..20 {
//!     sim.set_water(GridPos::new(x, 40), true);
//! }
//! sim.step();
//! let pressure = sim.pressure_field();
//! ```

pub mod error;
pub mod grid;
pub mod simulation;
pub mod solver;

pub use error::SimError;
pub use grid::{CellBuffers, Direction, Field, GridPos, GridSize, Vec2, WaterCell};
pub use simulation::{Model, SimulationConfig, WaterSimulation};
pub use solver::{
    Dispatch, FallingModel, FlowParams, ParallelScheduler, PressureModel, WaterSolver,
};
