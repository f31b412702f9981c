//! Read-only view of the previous tick's pressure and the boundary mask
//!
//! Both update phases only ever read *other* cells' pressure and boundary
//! flags, never their velocity. The scheduler keeps a whole-grid pressure
//! mirror for exactly this purpose, so workers can look across band edges
//! without touching another worker's cells.

use crate::grid::{Field, GridPos, GridSize};

pub(crate) struct GridView<'a> {
    pressure: &'a Field<f32>,
    boundaries: &'a Field<bool>,
}

impl<'a> GridView<'a> {
    pub(crate) fn new(pressure: &'a Field<f32>, boundaries: &'a Field<bool>) -> Self {
        debug_assert_eq!(pressure.size(), boundaries.size());
        Self {
            pressure,
            boundaries,
        }
    }

    pub(crate) fn size(&self) -> GridSize {
        self.pressure.size()
    }

    /// Cell indices of `pos` if it is on the grid and not a boundary
    #[inline]
    pub(crate) fn open(&self, pos: GridPos) -> Option<(usize, usize)> {
        self.size()
            .cell(pos)
            .filter(|&(x, y)| !self.boundaries.get(x, y))
    }

    #[inline]
    pub(crate) fn pressure(&self, x: usize, y: usize) -> f32 {
        self.pressure.get(x, y)
    }

    #[inline]
    pub(crate) fn is_boundary(&self, x: usize, y: usize) -> bool {
        self.boundaries.get(x, y)
    }
}
