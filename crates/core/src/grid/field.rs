//! Whole-grid field snapshots
//!
//! `Field<T>` stores one value per cell as a flat `Vec<T>` in row-major order.
//! It is what the query operations hand out (pressure and boundary snapshots)
//! and what the scheduler uses internally for the read-only pressure halo and
//! the boundary mask.

use super::position::{GridPos, GridSize};
use serde::{Deserialize, Serialize};

/// Row-major grid of per-cell values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field<T> {
    /// Field values in row-major order (y * width + x)
    data: Vec<T>,
    /// Grid width in cells
    width: usize,
    /// Grid height in cells
    height: usize,
}

impl<T: Copy> Field<T> {
    /// Create a field with every cell set to `value`
    ///
    /// # Arguments
    ///
    /// * `size` - Grid dimensions
    /// * `value` - Initial value for all cells
    #[must_use]
    pub fn with_value(size: GridSize, value: T) -> Self {
        Self {
            data: vec![value; size.cell_count()],
            width: size.width,
            height: size.height,
        }
    }

    /// Grid width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid dimensions
    #[must_use]
    pub fn size(&self) -> GridSize {
        GridSize::new(self.width, self.height)
    }

    /// Values in row-major order
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> T {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Get value at a signed position, `None` when it is off the grid
    #[must_use]
    pub fn at(&self, pos: GridPos) -> Option<T> {
        self.size()
            .cell(pos)
            .map(|(x, y)| self.data[y * self.width + x])
    }

    /// Iterate `(x, y, value)` over every cell
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, &value)| (idx % width, idx / width, value))
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub(crate) fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Mutable value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub(crate) fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        &mut self.data[y * self.width + x]
    }

    /// Overwrite every value with the matching one from `other`
    pub(crate) fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.size(), other.size());
        self.data.copy_from_slice(&other.data);
    }

    /// Values in row-major order, mutably
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl Field<f32> {
    /// Sum of all cell values
    #[must_use]
    pub fn total(&self) -> f32 {
        self.data.iter().sum()
    }
}

impl Field<bool> {
    /// Number of cells set to `true`
    #[must_use]
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}
