//! Water solver trait definition
//!
//! Every water model implements `WaterSolver`, so the simulation facade and
//! the tests can drive any of them through the same mutation and query
//! operations.

use crate::grid::{Field, GridPos, GridSize, Vec2, WaterCell};

/// Model-agnostic interface for the cellular water automata
///
/// Setters take signed positions; anything off the grid is silently ignored.
pub trait WaterSolver: Send {
    /// Grid dimensions in cells
    fn size(&self) -> GridSize;

    /// Paint or remove water
    ///
    /// `true` clears any boundary at `pos` and fills the cell with one full
    /// cell of water at rest. `false` empties the cell and stops it.
    fn set_water(&mut self, pos: GridPos, present: bool);

    /// Mark or unmark an impermeable cell
    ///
    /// Marking also empties the cell and stops it.
    fn set_boundary(&mut self, pos: GridPos, present: bool);

    /// Overwrite a cell's pressure; non-finite or negative values become 0
    fn set_pressure(&mut self, pos: GridPos, value: f32);

    /// Overwrite a cell's velocity
    fn set_velocity(&mut self, pos: GridPos, value: Vec2);

    /// Advance the simulation by one tick
    fn step(&mut self);

    /// Copy of one cell, `None` off the grid
    fn cell(&self, pos: GridPos) -> Option<WaterCell>;

    /// Owned snapshot of every cell's pressure
    fn pressure_field(&self) -> Field<f32>;

    /// Owned snapshot of the boundary mask
    fn boundary_field(&self) -> Field<bool>;

    /// Sum of pressure over the grid
    fn total_pressure(&self) -> f32 {
        self.pressure_field().total()
    }

    /// Stop any background work; later steps do nothing
    ///
    /// Safe to call more than once.
    fn shutdown(&mut self) {}
}

/// Clamp externally supplied pressure to a valid value
pub(crate) fn sanitize_pressure(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
