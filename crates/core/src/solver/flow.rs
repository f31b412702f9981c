//! Push-only pressure transfer (phase B)
//!
//! Each wet cell pushes water out of itself, never pulls: first along its
//! chosen direction, then sideways to both perpendicular neighbours, and
//! finally upward when it is over-compressed. Transfers read the current
//! buffer through a `GridView` and write into the next buffer through a
//! `TransferSink`, so the same rule serves the whole-grid buffers of a
//! single-threaded run and a worker's band.

use super::params::FlowParams;
use super::view::GridView;
use crate::grid::{CellBuffers, Direction, GridPos, Vec2, WaterCell};

/// Equilibrium pressure of the lower of two stacked cells holding `total`
///
/// Three regimes:
/// - up to one full cell, the lower cell simply holds `max_pressure`
/// - up to `2 * max_pressure + max_compression`, the lower cell takes a
///   linearly growing share of the extra as compression
/// - beyond that, the excess splits evenly with the lower cell keeping
///   `max_compression` more than the upper one
///
/// The regimes meet continuously and the function never decreases.
pub fn stable_state(total: f32, params: &FlowParams) -> f32 {
    let max_pressure = params.max_pressure;
    let max_compression = params.max_compression;

    if total <= max_pressure {
        max_pressure
    } else if total < 2.0 * max_pressure + max_compression {
        (max_pressure * max_pressure + total * max_compression) / (max_pressure + max_compression)
    } else {
        (total + max_compression) / 2.0
    }
}

/// Destination of transfers for one tick
pub(crate) trait TransferSink {
    /// Add `amount` moving at `velocity` to the next-buffer cell at `(x, y)`
    fn deposit(&mut self, x: usize, y: usize, amount: f32, velocity: Vec2);

    /// Remove `amount` from the next-buffer cell at `(x, y)`
    fn withdraw(&mut self, x: usize, y: usize, amount: f32);
}

impl TransferSink for CellBuffers {
    fn deposit(&mut self, x: usize, y: usize, amount: f32, velocity: Vec2) {
        self.next_mut(x, y).receive(amount, velocity);
    }

    fn withdraw(&mut self, x: usize, y: usize, amount: f32) {
        self.next_mut(x, y).pressure -= amount;
    }
}

/// Move `amount` of water carrying `velocity` from `src` to `dst`
///
/// Does nothing for self-transfers, zero amounts, or when either end is a
/// boundary cell.
pub(crate) fn transfer<S: TransferSink + ?Sized>(
    sink: &mut S,
    view: &GridView<'_>,
    amount: f32,
    velocity: Vec2,
    src: (usize, usize),
    dst: (usize, usize),
) {
    if src == dst
        || amount == 0.0
        || view.is_boundary(src.0, src.1)
        || view.is_boundary(dst.0, dst.1)
    {
        return;
    }

    sink.deposit(dst.0, dst.1, amount, velocity);
    sink.withdraw(src.0, src.1, amount);
}

/// Push water out of the cell at `(x, y)` following `dir`
///
/// `cell` is the cell's current state (after phase A). Pressures of the
/// neighbours come from `view`; all writes go to `sink`.
pub(crate) fn push_cell<S: TransferSink + ?Sized>(
    sink: &mut S,
    view: &GridView<'_>,
    params: &FlowParams,
    (x, y): (usize, usize),
    cell: &WaterCell,
    dir: Direction,
) {
    if cell.pressure.is_nan()
        || cell.pressure < params.min_pressure
        || dir.is_none()
        || view.is_boundary(x, y)
    {
        return;
    }

    let src = (x, y);
    let pos = GridPos::from_cell(x, y);
    let pressure = cell.pressure;
    let mut remaining = pressure;

    // Wanted direction, with a look at the cell above the target so water
    // stacks into compression instead of stopping at one full cell
    let target_pos = pos.step(dir);
    if let Some(target) = view.open(target_pos) {
        let target_pressure = view.pressure(target.0, target.1);
        let flow = if view.open(target_pos.step(Direction::UP)).is_some() {
            stable_state(pressure + target_pressure, params) - target_pressure
        } else {
            params.max_pressure - target_pressure
        };
        let flow = flow.clamp(0.0, params.max_flow.min(remaining));

        transfer(sink, view, flow, cell.velocity, src, target);
        remaining -= flow;
        if remaining <= 0.0 {
            return;
        }
    }

    // Equalize with both perpendicular neighbours
    for side in [dir.left(), dir.right()] {
        if let Some(neighbour) = view.open(pos.step(side)) {
            let flow = (pressure - view.pressure(neighbour.0, neighbour.1)) / 4.0;
            let flow = flow.clamp(0.0, remaining);

            let (sx, sy) = side.as_f32();
            let velocity = Vec2::new(sx, sy).component_mul(&cell.velocity) * 0.5;
            transfer(sink, view, flow, velocity, src, neighbour);
            remaining -= flow;
            if remaining <= 0.0 {
                return;
            }
        }
    }

    // Only compressed water flows upwards
    if let Some(up) = view.open(pos.step(Direction::UP)) {
        let flow = remaining - stable_state(remaining + view.pressure(up.0, up.1), params);
        let flow = flow.clamp(0.0, params.max_flow.min(remaining));

        let velocity = Vec2::new(cell.velocity.x, 0.5);
        transfer(sink, view, flow, velocity, src, up);
    }
}
