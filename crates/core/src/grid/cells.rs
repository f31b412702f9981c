//! Water cells and their double buffer
//!
//! `CellBuffers` holds the current and next-step cells for one contiguous
//! range of columns. A single-threaded model owns one buffer spanning the
//! whole grid; the parallel scheduler gives every worker its own range.
//! Cells are stored column-major inside the range so a band's columns are
//! contiguous in memory.

use super::position::GridSize;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// 2D vector type for cell velocities
pub type Vec2 = Vector2<f32>;

/// Per-cell water state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterCell {
    /// Velocity in cells per tick (y grows upward)
    pub velocity: Vec2,
    /// Normalized water volume; 1.0 is one full cell at rest
    pub pressure: f32,
}

impl WaterCell {
    /// Cell holding `pressure` at rest
    #[must_use]
    pub fn with_pressure(pressure: f32) -> Self {
        Self {
            velocity: Vec2::zeros(),
            pressure,
        }
    }

    /// Blend an incoming `amount` travelling at `velocity` into this cell
    ///
    /// The velocity becomes the pressure-weighted average of the existing and
    /// incoming velocities, then the pressure grows by `amount`.
    pub fn receive(&mut self, amount: f32, velocity: Vec2) {
        let total = self.pressure + amount;
        if total > f32::EPSILON {
            self.velocity = (self.velocity * self.pressure + velocity * amount) / total;
        }
        self.pressure = total;
    }

    /// Reset to a dry cell at rest
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for WaterCell {
    fn default() -> Self {
        Self::with_pressure(0.0)
    }
}

/// Current and next buffers for a contiguous column range
#[derive(Debug, Clone)]
pub struct CellBuffers {
    columns: Range<usize>,
    height: usize,
    current: Vec<WaterCell>,
    next: Vec<WaterCell>,
}

impl CellBuffers {
    /// Create dry buffers covering `columns` of a grid `height` rows tall
    #[must_use]
    pub fn new(columns: Range<usize>, height: usize) -> Self {
        let len = columns.len() * height;
        Self {
            columns,
            height,
            current: vec![WaterCell::default(); len],
            next: vec![WaterCell::default(); len],
        }
    }

    /// Create dry buffers covering a whole grid
    #[must_use]
    pub fn full(size: GridSize) -> Self {
        Self::new(0..size.width, size.height)
    }

    /// Columns owned by these buffers
    #[must_use]
    pub fn columns(&self) -> Range<usize> {
        self.columns.clone()
    }

    /// Grid height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether column `x` belongs to this range
    #[must_use]
    pub fn owns_column(&self, x: usize) -> bool {
        self.columns.contains(&x)
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.owns_column(x) && y < self.height);
        (x - self.columns.start) * self.height + y
    }

    /// Current-buffer cell at global coordinates
    #[inline]
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> &WaterCell {
        &self.current[self.index(x, y)]
    }

    /// Mutable current-buffer cell at global coordinates
    #[inline]
    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut WaterCell {
        let idx = self.index(x, y);
        &mut self.current[idx]
    }

    /// Mutable next-buffer cell at global coordinates
    #[inline]
    pub fn next_mut(&mut self, x: usize, y: usize) -> &mut WaterCell {
        let idx = self.index(x, y);
        &mut self.next[idx]
    }

    /// Iterate `(x, y, cell)` over the current buffer
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &WaterCell)> + '_ {
        let start = self.columns.start;
        let height = self.height;
        self.current
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (start + idx / height, idx % height, cell))
    }

    /// Iterate `(x, y, cell)` mutably over the current buffer
    pub fn cells_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut WaterCell)> + '_ {
        let start = self.columns.start;
        let height = self.height;
        self.current
            .iter_mut()
            .enumerate()
            .map(move |(idx, cell)| (start + idx / height, idx % height, cell))
    }

    /// Copy the current buffer into the next buffer before transfers start
    pub fn begin_transfers(&mut self) {
        self.next.copy_from_slice(&self.current);
    }

    /// Make the next buffer current
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Sum of current pressures
    #[must_use]
    pub fn total_pressure(&self) -> f32 {
        self.current.iter().map(|cell| cell.pressure).sum()
    }
}
