//! Per-cell locks for transfers that cross a band edge
//!
//! A worker writes its own band's next buffer directly. When a push targets
//! a column owned by another band, the amount is recorded here instead,
//! under that cell's lock. The driver folds these inflows into the owning
//! band once every worker has finished the phase, so no two workers ever
//! hold the same band.

use crate::grid::{CellBuffers, GridSize, Vec2};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Water recorded against one cell during a phase
#[derive(Debug, Clone, Copy, Default)]
struct Inflow {
    added: f32,
    removed: f32,
    /// Sum of `velocity * amount` over everything added
    momentum: Vec2,
}

impl Inflow {
    fn is_empty(&self) -> bool {
        self.added == 0.0 && self.removed == 0.0
    }
}

/// One mutex per grid cell, indexed column-major
pub(crate) struct CellLockSet {
    height: usize,
    cells: Vec<Mutex<Inflow>>,
}

impl CellLockSet {
    pub(crate) fn new(size: GridSize) -> Self {
        Self {
            height: size.height,
            cells: (0..size.cell_count())
                .map(|_| Mutex::new(Inflow::default()))
                .collect(),
        }
    }

    fn lock(&self, x: usize, y: usize) -> MutexGuard<'_, Inflow> {
        // A panicking worker cannot leave an inflow half-written
        self.cells[x * self.height + y]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn deposit(&self, x: usize, y: usize, amount: f32, velocity: Vec2) {
        let mut inflow = self.lock(x, y);
        inflow.added += amount;
        inflow.momentum += velocity * amount;
    }

    pub(crate) fn withdraw(&self, x: usize, y: usize, amount: f32) {
        self.lock(x, y).removed += amount;
    }

    /// Fold and clear every inflow recorded for column `x` into `buffers`
    ///
    /// Returns the number of cells that had something recorded.
    pub(crate) fn drain_column(&self, x: usize, buffers: &mut CellBuffers) -> usize {
        let mut touched = 0;
        for y in 0..self.height {
            let inflow = std::mem::take(&mut *self.lock(x, y));
            if inflow.is_empty() {
                continue;
            }
            touched += 1;

            let cell = buffers.next_mut(x, y);
            let total = cell.pressure + inflow.added;
            if inflow.added > 0.0 && total > f32::EPSILON {
                cell.velocity = (cell.velocity * cell.pressure + inflow.momentum) / total;
            }
            cell.pressure = total - inflow.removed;
        }
        touched
    }
}
