//! One worker's column range
//!
//! A band owns the cells, push directions and random stream for a
//! contiguous range of columns. Both phases only ever mutate the band's own
//! data; anything that must land in another band goes through the
//! `CellLockSet`.

use super::flow::{push_cell, TransferSink};
use super::lock_set::CellLockSet;
use super::params::FlowParams;
use super::velocity::{choose_direction, integrate};
use super::view::GridView;
use crate::grid::{CellBuffers, Direction, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::Range;

pub(crate) struct Band {
    pub(crate) cells: CellBuffers,
    directions: Vec<Direction>,
    rng: StdRng,
}

impl Band {
    pub(crate) fn new(index: usize, columns: Range<usize>, height: usize, seed: u64) -> Self {
        let cells = CellBuffers::new(columns, height);
        let len = cells.columns().len() * height;
        Self {
            cells,
            directions: vec![Direction::NONE; len],
            rng: StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        }
    }

    pub(crate) fn columns(&self) -> Range<usize> {
        self.cells.columns()
    }

    /// Phase A: integrate velocity and sample a push direction for every cell
    pub(crate) fn integrate_velocities(&mut self, view: &GridView<'_>, params: &FlowParams) {
        let Self {
            cells,
            directions,
            rng,
        } = self;

        // Cells and directions share the same column-major order
        for ((x, y, cell), dir) in cells.cells_mut().zip(directions.iter_mut()) {
            integrate(cell, x, y, view, params);
            *dir = if view.is_boundary(x, y) {
                Direction::NONE
            } else {
                choose_direction(cell, params, rng)
            };
        }
    }

    /// Phase B: push water out of every cell into the next buffer
    ///
    /// Expects `begin_transfers` to have been called on the band's buffers.
    pub(crate) fn push_fluid(
        &mut self,
        view: &GridView<'_>,
        locks: &CellLockSet,
        params: &FlowParams,
    ) {
        let height = self.cells.height();
        let mut sink = BandSink {
            cells: &mut self.cells,
            locks,
        };

        for (idx, &dir) in self.directions.iter().enumerate() {
            if dir.is_none() {
                continue;
            }
            let x = sink.cells.columns().start + idx / height;
            let y = idx % height;
            let cell = *sink.cells.cell(x, y);
            push_cell(&mut sink, view, params, (x, y), &cell, dir);
        }
    }

    /// Columns that can receive water from a neighbouring band
    pub(crate) fn edge_columns(&self) -> impl Iterator<Item = usize> {
        let columns = self.columns();
        let first = columns.start;
        let last = columns.end - 1;
        std::iter::once(first).chain((last != first).then_some(last))
    }
}

/// Routes transfers to the band's own next buffer or to the lock set
struct BandSink<'a> {
    cells: &'a mut CellBuffers,
    locks: &'a CellLockSet,
}

impl TransferSink for BandSink<'_> {
    fn deposit(&mut self, x: usize, y: usize, amount: f32, velocity: Vec2) {
        if self.cells.owns_column(x) {
            self.cells.deposit(x, y, amount, velocity);
        } else {
            self.locks.deposit(x, y, amount, velocity);
        }
    }

    fn withdraw(&mut self, x: usize, y: usize, amount: f32) {
        if self.cells.owns_column(x) {
            self.cells.withdraw(x, y, amount);
        } else {
            self.locks.withdraw(x, y, amount);
        }
    }
}
