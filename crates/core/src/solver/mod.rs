//! Water models and their shared update rules
//!
//! Three models implement the `WaterSolver` trait:
//!
//! - `ParallelScheduler`: pressure + velocity cellular automaton, run on
//!   column bands by a worker pool or rayon fork-join
//! - `PressureModel`: serial pressure-only push flow
//! - `FallingModel`: discrete falling water
//!
//! The pressure + velocity rules live in `velocity` (phase A) and `flow`
//! (phase B); the scheduler only decides who runs them on which cells.
//!
//! # Example
//!
//! ```rust,ignore
//! use water_sim_core::solver::{Dispatch, FlowParams, ParallelScheduler, WaterSolver};
//! use water_sim_core::{GridPos, GridSize};
//!
//! let mut sim = ParallelScheduler::new(
//!     GridSize::new(64, 64),
//!     FlowParams::default(),
//!     Dispatch::WorkerPool,
//!     None,
//!     0,
//! )?;
//! sim.set_water(GridPos::new(10, 60), true);
//! sim.step();
//! ```

mod band;
mod falling;
pub mod flow;
mod lock_set;
mod params;
mod pressure;
pub mod profiler;
mod scheduler;
mod settle;
#[allow(clippy::module_name_repetitions)]
mod r#trait;
pub mod velocity;
mod view;

// Re-exports
pub use falling::FallingModel;
pub use flow::stable_state;
pub use params::FlowParams;
pub use pressure::PressureModel;
pub use profiler::{FrameTimer, ProfilerScope};
pub use r#trait::WaterSolver;
pub use scheduler::{Dispatch, ParallelScheduler};
pub use velocity::choose_direction;
