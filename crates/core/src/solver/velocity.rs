//! Velocity integration and push-direction sampling (phase A)
//!
//! Every cell is independent within the phase: velocity only depends on the
//! cell's own state and on the previous tick's pressure of its four
//! neighbours, which nobody writes during phase A.

use super::params::FlowParams;
use super::view::GridView;
use crate::grid::{Direction, GridPos, Vec2, WaterCell};
use rand::Rng;

const NEIGHBOURS: [Direction; 4] = [
    Direction::UP,
    Direction::DOWN,
    Direction::RIGHT,
    Direction::LEFT,
];

/// Apply drag, gravity and the pressure-gradient push to one cell
///
/// Boundary cells still get drag and gravity (they are zeroed at the end of
/// the tick anyway) but never feel pressure.
pub(crate) fn integrate(
    cell: &mut WaterCell,
    x: usize,
    y: usize,
    view: &GridView<'_>,
    params: &FlowParams,
) {
    cell.velocity *= 1.0 - params.drag;
    cell.velocity.y += params.gravity;

    if view.is_boundary(x, y) {
        return;
    }

    let pos = GridPos::from_cell(x, y);
    for dir in NEIGHBOURS {
        if let Some((nx, ny)) = view.open(pos.step(dir)) {
            let (dx, dy) = dir.as_f32();
            let gradient = cell.pressure - view.pressure(nx, ny);
            cell.velocity += Vec2::new(dx, dy) * gradient * params.flow_gain;
        }
    }
}

/// Pick this tick's push direction from a cell's velocity
///
/// The axis is chosen with probability proportional to that component's
/// share of `|vx| + |vy|`; the move along it is then committed with
/// probability `share * velocity_multiplier`. A cell can therefore end up
/// with no direction even while moving.
pub fn choose_direction<R: Rng + ?Sized>(
    cell: &WaterCell,
    params: &FlowParams,
    rng: &mut R,
) -> Direction {
    if cell.pressure == 0.0 || cell.velocity == Vec2::zeros() {
        return Direction::NONE;
    }

    let abs_x = cell.velocity.x.abs();
    let abs_y = cell.velocity.y.abs();
    let total = abs_x + abs_y;
    let x_share = abs_x / total;
    let y_share = abs_y / total;

    if rng.random::<f32>() <= x_share {
        if rng.random::<f32>() < x_share * params.velocity_multiplier {
            Direction::along_x(cell.velocity.x)
        } else {
            Direction::NONE
        }
    } else if rng.random::<f32>() < y_share * params.velocity_multiplier {
        Direction::along_y(cell.velocity.y)
    } else {
        Direction::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Field, GridSize};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fields(size: GridSize) -> (Field<f32>, Field<bool>) {
        (Field::with_value(size, 0.0), Field::with_value(size, false))
    }

    #[test]
    fn test_drag_then_gravity() {
        let (pressure, boundaries) = fields(GridSize::new(1, 1));
        let view = GridView::new(&pressure, &boundaries);
        let params = FlowParams::default();

        let mut cell = WaterCell {
            velocity: Vec2::new(1.0, 1.0),
            pressure: 0.0,
        };
        integrate(&mut cell, 0, 0, &view, &params);
        assert_relative_eq!(cell.velocity.x, 0.9);
        assert_relative_eq!(cell.velocity.y, 0.9 - 0.1);
    }

    #[test]
    fn test_pressure_gradient_pushes_toward_lower_pressure() {
        let size = GridSize::new(3, 1);
        let (mut pressure, boundaries) = fields(size);
        pressure.set(1, 0, 1.0);
        let view = GridView::new(&pressure, &boundaries);
        let params = FlowParams {
            gravity: 0.0,
            ..Default::default()
        };

        // Symmetric neighbours cancel out
        let mut middle = WaterCell::with_pressure(1.0);
        integrate(&mut middle, 1, 0, &view, &params);
        assert_relative_eq!(middle.velocity.x, 0.0);

        // Left cell sees higher pressure to its right and is pushed left
        let mut left = WaterCell::default();
        integrate(&mut left, 0, 0, &view, &params);
        assert_relative_eq!(left.velocity.x, -params.flow_gain);
    }

    #[test]
    fn test_boundary_neighbours_exert_no_push() {
        let size = GridSize::new(2, 1);
        let (pressure, mut boundaries) = fields(size);
        boundaries.set(1, 0, true);
        let view = GridView::new(&pressure, &boundaries);
        let params = FlowParams {
            gravity: 0.0,
            ..Default::default()
        };

        let mut cell = WaterCell::with_pressure(1.0);
        integrate(&mut cell, 0, 0, &view, &params);
        assert_eq!(cell.velocity, Vec2::zeros());
    }

    #[test]
    fn test_no_direction_without_water_or_motion() {
        let params = FlowParams::default();
        let mut rng = StdRng::seed_from_u64(7);

        let still = WaterCell::with_pressure(1.0);
        assert!(choose_direction(&still, &params, &mut rng).is_none());

        let dry = WaterCell {
            velocity: Vec2::new(0.3, -0.2),
            pressure: 0.0,
        };
        assert!(choose_direction(&dry, &params, &mut rng).is_none());
    }

    #[test]
    fn test_pure_axis_velocity_always_moves_along_it() {
        let params = FlowParams::default();
        let mut rng = StdRng::seed_from_u64(11);

        let falling = WaterCell {
            velocity: Vec2::new(0.0, -0.5),
            pressure: 1.0,
        };
        let rightward = WaterCell {
            velocity: Vec2::new(2.0, 0.0),
            pressure: 1.0,
        };
        for _ in 0..100 {
            assert_eq!(choose_direction(&falling, &params, &mut rng), Direction::DOWN);
            assert_eq!(choose_direction(&rightward, &params, &mut rng), Direction::RIGHT);
        }
    }

    #[test]
    fn test_zero_multiplier_never_moves() {
        let params = FlowParams {
            velocity_multiplier: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let cell = WaterCell {
            velocity: Vec2::new(0.7, -0.4),
            pressure: 1.0,
        };
        for _ in 0..100 {
            assert!(choose_direction(&cell, &params, &mut rng).is_none());
        }
    }

    #[test]
    fn test_direction_has_at_most_one_axis() {
        let params = FlowParams::default();
        let mut rng = StdRng::seed_from_u64(99);
        let mut moved = 0;
        for i in 0..500 {
            let angle = i as f32 * 0.1;
            let cell = WaterCell {
                velocity: Vec2::new(angle.cos(), angle.sin()),
                pressure: 1.0,
            };
            let dir = choose_direction(&cell, &params, &mut rng);
            assert!(dir.dx == 0 || dir.dy == 0);
            assert!(dir.dx.abs() <= 1 && dir.dy.abs() <= 1);
            if !dir.is_none() {
                moved += 1;
                // Never moves against the velocity component it follows
                assert!(f32::from(dir.dx) * cell.velocity.x >= 0.0);
                assert!(f32::from(dir.dy) * cell.velocity.y >= 0.0);
            }
        }
        assert!(moved > 0);
    }
}
