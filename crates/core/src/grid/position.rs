//! Grid coordinates, dimensions and axis directions
//!
//! `x` grows to the right and `y` grows upward, so gravity pulls toward
//! negative `y`. Positions are signed: a painting caller can hand in any
//! coordinate and `GridSize::cell` decides whether it lands on the grid.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Signed cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Column (grows to the right)
    pub x: i32,
    /// Row (grows upward)
    pub y: i32,
}

impl GridPos {
    /// Create a position from signed coordinates
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Create a position from in-grid unsigned indices
    #[must_use]
    pub const fn from_cell(x: usize, y: usize) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }

    /// Position one step along `dir`
    #[must_use]
    pub fn step(self, dir: Direction) -> Self {
        Self {
            x: self.x + i32::from(dir.dx),
            y: self.y + i32::from(dir.dy),
        }
    }

    /// Position `dx`, `dy` away from this one
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Fixed grid dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl GridSize {
    /// Create a grid size
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of cells
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Resolve a signed position to unsigned cell indices
    ///
    /// # Returns
    ///
    /// `Some((x, y))` when the position lies inside `[0, width) × [0, height)`,
    /// `None` otherwise.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<(usize, usize)> {
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Check if a signed position lies on the grid
    #[must_use]
    pub fn contains(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some()
    }

    /// Reject empty grids and grids too large to address
    ///
    /// Both sides must be non-zero and representable as an `i32` so every
    /// cell has a signed position, and the cell count must fit in `usize`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidDimensions` otherwise.
    pub fn validate(&self) -> Result<(), SimError> {
        let addressable = |side: usize| side > 0 && i32::try_from(side).is_ok();
        if addressable(self.width)
            && addressable(self.height)
            && self.width.checked_mul(self.height).is_some()
        {
            Ok(())
        } else {
            Err(SimError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Axis-aligned unit step with at most one non-zero component
///
/// This is the per-cell push direction chosen every tick. Both components
/// are in `{-1, 0, 1}` and at most one of them is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Direction {
    /// Horizontal component
    pub dx: i8,
    /// Vertical component
    pub dy: i8,
}

impl Direction {
    /// No intended motion
    pub const NONE: Self = Self { dx: 0, dy: 0 };
    /// Toward positive `y`
    pub const UP: Self = Self { dx: 0, dy: 1 };
    /// Toward negative `y`
    pub const DOWN: Self = Self { dx: 0, dy: -1 };
    /// Toward negative `x`
    pub const LEFT: Self = Self { dx: -1, dy: 0 };
    /// Toward positive `x`
    pub const RIGHT: Self = Self { dx: 1, dy: 0 };

    /// Direction along the x axis with the sign of `component` (zero stays zero)
    #[must_use]
    pub fn along_x(component: f32) -> Self {
        Self {
            dx: sign(component),
            dy: 0,
        }
    }

    /// Direction along the y axis with the sign of `component` (zero stays zero)
    #[must_use]
    pub fn along_y(component: f32) -> Self {
        Self {
            dx: 0,
            dy: sign(component),
        }
    }

    /// Whether this direction asks for no movement
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Quarter turn: `(dx, dy) -> (dy, -dx)`
    #[must_use]
    pub const fn left(self) -> Self {
        Self {
            dx: self.dy,
            dy: -self.dx,
        }
    }

    /// Quarter turn the other way: `(dx, dy) -> (-dy, dx)`
    #[must_use]
    pub const fn right(self) -> Self {
        Self {
            dx: -self.dy,
            dy: self.dx,
        }
    }

    /// Components as floats, for scaling velocities
    #[must_use]
    pub fn as_f32(self) -> (f32, f32) {
        (f32::from(self.dx), f32::from(self.dy))
    }
}

/// Sign of a float as -1, 0 or 1 (`f32::signum` maps 0.0 to 1.0, which is not wanted here)
fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_cell_lookup() {
        let size = GridSize::new(4, 3);
        assert_eq!(size.cell(GridPos::new(0, 0)), Some((0, 0)));
        assert_eq!(size.cell(GridPos::new(3, 2)), Some((3, 2)));
        assert_eq!(size.cell(GridPos::new(4, 0)), None);
        assert_eq!(size.cell(GridPos::new(0, 3)), None);
        assert_eq!(size.cell(GridPos::new(-1, 1)), None);
        assert_eq!(size.cell(GridPos::new(1, i32::MIN)), None);
        assert_eq!(size.cell_count(), 12);
    }

    #[test]
    fn test_grid_size_validation() {
        assert!(GridSize::new(1, 1).validate().is_ok());
        assert!(GridSize::new(0, 5).validate().is_err());
        assert!(GridSize::new(5, 0).validate().is_err());
        assert!(GridSize::new(usize::MAX, 2).validate().is_err());
    }

    #[test]
    fn test_direction_rotations() {
        assert_eq!(Direction::UP.left(), Direction::RIGHT);
        assert_eq!(Direction::UP.right(), Direction::LEFT);
        assert_eq!(Direction::RIGHT.left(), Direction::DOWN);
        assert_eq!(Direction::DOWN.right(), Direction::RIGHT);
        // Left and right are mirror images of each other
        for dir in [Direction::UP, Direction::DOWN, Direction::LEFT, Direction::RIGHT] {
            let l = dir.left();
            let r = dir.right();
            assert_eq!((l.dx, l.dy), (-r.dx, -r.dy));
        }
    }

    #[test]
    fn test_direction_sign_of_zero() {
        assert!(Direction::along_x(0.0).is_none());
        assert!(Direction::along_y(-0.0).is_none());
        assert_eq!(Direction::along_x(-3.5), Direction::LEFT);
        assert_eq!(Direction::along_y(0.2), Direction::UP);
    }

    #[test]
    fn test_step_and_offset() {
        let pos = GridPos::new(2, 2);
        assert_eq!(pos.step(Direction::DOWN), GridPos::new(2, 1));
        assert_eq!(pos.step(Direction::NONE), pos);
        assert_eq!(pos.offset(-3, 1), GridPos::new(-1, 3));
    }
}
