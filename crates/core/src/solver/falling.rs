//! Discrete falling water
//!
//! Every cell is empty, water or a wall. Water drops straight down when it
//! can, otherwise slides diagonally down or sideways toward its heading,
//! and turns around when boxed in. Pressure is reported as exactly 0 or 1.

use super::r#trait::{sanitize_pressure, WaterSolver};
use crate::error::SimError;
use crate::grid::{Field, GridPos, GridSize, Vec2, WaterCell};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Empty,
    Water,
    Wall,
}

/// Serial falling-water model
pub struct FallingModel {
    kinds: Field<Kind>,
    /// `true` heads toward positive `x`
    headings: Field<bool>,
    rng: StdRng,
    sweep_forward: bool,
}

impl FallingModel {
    /// Create an empty grid
    ///
    /// # Errors
    ///
    /// Fails on invalid dimensions.
    pub fn new(size: GridSize, seed: u64) -> Result<Self, SimError> {
        size.validate()?;
        Ok(Self {
            kinds: Field::with_value(size, Kind::Empty),
            headings: Field::with_value(size, false),
            rng: StdRng::seed_from_u64(seed),
            sweep_forward: false,
        })
    }

    fn is_empty(&self, pos: GridPos) -> Option<(usize, usize)> {
        self.kinds
            .size()
            .cell(pos)
            .filter(|&(x, y)| self.kinds.get(x, y) == Kind::Empty)
    }

    fn move_water(&mut self, from: (usize, usize), to: (usize, usize)) {
        let heading = self.headings.get(from.0, from.1);
        self.kinds.set(from.0, from.1, Kind::Empty);
        self.kinds.set(to.0, to.1, Kind::Water);
        self.headings.set(to.0, to.1, heading);
    }

    fn update_cell(&mut self, x: usize, y: usize) {
        if self.kinds.get(x, y) != Kind::Water {
            return;
        }
        let pos = GridPos::from_cell(x, y);
        let dx = if self.headings.get(x, y) { 1 } else { -1 };

        let target = self
            .is_empty(pos.offset(0, -1))
            .or_else(|| self.is_empty(pos.offset(dx, -1)))
            .or_else(|| self.is_empty(pos.offset(dx, 0)));

        match target {
            Some(to) => self.move_water((x, y), to),
            None => {
                let heading = self.headings.get_mut(x, y);
                *heading = !*heading;
            }
        }
    }
}

impl WaterSolver for FallingModel {
    fn size(&self) -> GridSize {
        self.kinds.size()
    }

    fn set_water(&mut self, pos: GridPos, present: bool) {
        let Some((x, y)) = self.kinds.size().cell(pos) else {
            return;
        };
        if present {
            self.kinds.set(x, y, Kind::Water);
            let heading = self.rng.random::<bool>();
            self.headings.set(x, y, heading);
        } else if self.kinds.get(x, y) == Kind::Water {
            self.kinds.set(x, y, Kind::Empty);
        }
    }

    fn set_boundary(&mut self, pos: GridPos, present: bool) {
        let Some((x, y)) = self.kinds.size().cell(pos) else {
            return;
        };
        if present {
            self.kinds.set(x, y, Kind::Wall);
        } else if self.kinds.get(x, y) == Kind::Wall {
            self.kinds.set(x, y, Kind::Empty);
        }
    }

    /// At least half a cell counts as water
    fn set_pressure(&mut self, pos: GridPos, value: f32) {
        self.set_water(pos, sanitize_pressure(value) >= 0.5);
    }

    fn set_velocity(&mut self, _pos: GridPos, _value: Vec2) {}

    fn step(&mut self) {
        self.sweep_forward = !self.sweep_forward;
        let size = self.kinds.size();

        // Bottom-up, so a drop moves at most one row per tick
        for y in 0..size.height {
            for i in 0..size.width {
                let x = if self.sweep_forward {
                    i
                } else {
                    size.width - 1 - i
                };
                self.update_cell(x, y);
            }
        }
    }

    fn cell(&self, pos: GridPos) -> Option<WaterCell> {
        self.kinds.at(pos).map(|kind| {
            WaterCell::with_pressure(if kind == Kind::Water { 1.0 } else { 0.0 })
        })
    }

    fn pressure_field(&self) -> Field<f32> {
        let mut field = Field::with_value(self.kinds.size(), 0.0);
        for (x, y, kind) in self.kinds.cells() {
            if kind == Kind::Water {
                field.set(x, y, 1.0);
            }
        }
        field
    }

    fn boundary_field(&self) -> Field<bool> {
        let mut field = Field::with_value(self.kinds.size(), false);
        for (x, y, kind) in self.kinds.cells() {
            field.set(x, y, kind == Kind::Wall);
        }
        field
    }
}
