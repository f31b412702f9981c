//! End-of-tick cleanup shared by the continuous models

use crate::grid::{CellBuffers, Field, Vec2};

/// Restore the cell invariants after a tick's transfers are committed
///
/// Boundary cells are emptied and stopped. Pressure that round-off pushed
/// below zero (or to NaN) becomes 0, non-finite velocity is zeroed, and
/// cells too dry to push lose their velocity.
pub(crate) fn settle(cells: &mut CellBuffers, boundaries: &Field<bool>, min_pressure: f32) {
    for (x, y, cell) in cells.cells_mut() {
        if boundaries.get(x, y) {
            cell.clear();
            continue;
        }
        if !cell.pressure.is_finite() || cell.pressure < 0.0 {
            cell.pressure = 0.0;
        }
        if !cell.velocity.iter().all(|v| v.is_finite()) || cell.pressure < min_pressure {
            cell.velocity = Vec2::zeros();
        }
    }
}
