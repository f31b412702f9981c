//! Pressure-only push flow
//!
//! The simplest continuous model: no velocity at all. Every wet cell pushes
//! down, then sideways, then (when compressed) up, always in that order.
//! Runs single-threaded over whole-grid `Field`s with a ping-pong buffer.

use super::flow::{stable_state, transfer, TransferSink};
use super::params::FlowParams;
use super::r#trait::{sanitize_pressure, WaterSolver};
use super::view::GridView;
use crate::error::SimError;
use crate::grid::{Direction, Field, GridPos, GridSize, Vec2, WaterCell};

impl TransferSink for Field<f32> {
    fn deposit(&mut self, x: usize, y: usize, amount: f32, _velocity: Vec2) {
        *self.get_mut(x, y) += amount;
    }

    fn withdraw(&mut self, x: usize, y: usize, amount: f32) {
        *self.get_mut(x, y) -= amount;
    }
}

/// Serial pressure-only water model
pub struct PressureModel {
    params: FlowParams,
    current: Field<f32>,
    next: Field<f32>,
    boundaries: Field<bool>,
}

impl PressureModel {
    /// Create a dry grid
    ///
    /// # Errors
    ///
    /// Fails on invalid dimensions or parameters.
    pub fn new(size: GridSize, params: FlowParams) -> Result<Self, SimError> {
        size.validate()?;
        params.validate()?;
        Ok(Self {
            params,
            current: Field::with_value(size, 0.0),
            next: Field::with_value(size, 0.0),
            boundaries: Field::with_value(size, false),
        })
    }

    /// Large flows are halved to keep neighbours from overshooting each other
    fn damp(&self, flow: f32) -> f32 {
        if flow > self.params.min_flow {
            flow * 0.5
        } else {
            flow
        }
    }

    fn push_cell(&mut self, x: usize, y: usize) {
        let params = self.params;
        let view = GridView::new(&self.current, &self.boundaries);
        let pressure = view.pressure(x, y);
        if view.is_boundary(x, y) || pressure.is_nan() || pressure < params.min_pressure {
            return;
        }

        let src = (x, y);
        let pos = GridPos::from_cell(x, y);
        let mut remaining = pressure;

        if let Some(down) = view.open(pos.step(Direction::DOWN)) {
            let below = view.pressure(down.0, down.1);
            let flow = self.damp(stable_state(remaining + below, &params) - below);
            let flow = flow.clamp(0.0, params.max_flow.min(remaining));
            transfer(&mut self.next, &view, flow, Vec2::zeros(), src, down);
            remaining -= flow;
            if remaining <= 0.0 {
                return;
            }
        }

        for side in [Direction::LEFT, Direction::RIGHT] {
            if let Some(neighbour) = view.open(pos.step(side)) {
                let flow = self.damp((pressure - view.pressure(neighbour.0, neighbour.1)) / 4.0);
                let flow = flow.clamp(0.0, remaining);
                transfer(&mut self.next, &view, flow, Vec2::zeros(), src, neighbour);
                remaining -= flow;
                if remaining <= 0.0 {
                    return;
                }
            }
        }

        // Only compressed water flows upwards
        if let Some(up) = view.open(pos.step(Direction::UP)) {
            let flow = remaining - stable_state(remaining + view.pressure(up.0, up.1), &params);
            let flow = self.damp(flow).clamp(0.0, params.max_flow.min(remaining));
            transfer(&mut self.next, &view, flow, Vec2::zeros(), src, up);
        }
    }
}

impl WaterSolver for PressureModel {
    fn size(&self) -> GridSize {
        self.current.size()
    }

    fn set_water(&mut self, pos: GridPos, present: bool) {
        let Some((x, y)) = self.current.size().cell(pos) else {
            return;
        };
        if present {
            self.boundaries.set(x, y, false);
            self.current.set(x, y, self.params.max_pressure);
        } else {
            self.current.set(x, y, 0.0);
        }
    }

    fn set_boundary(&mut self, pos: GridPos, present: bool) {
        let Some((x, y)) = self.current.size().cell(pos) else {
            return;
        };
        self.boundaries.set(x, y, present);
        if present {
            self.current.set(x, y, 0.0);
        }
    }

    fn set_pressure(&mut self, pos: GridPos, value: f32) {
        if let Some((x, y)) = self.current.size().cell(pos) {
            if !self.boundaries.get(x, y) {
                self.current.set(x, y, sanitize_pressure(value));
            }
        }
    }

    fn set_velocity(&mut self, _pos: GridPos, _value: Vec2) {}

    fn step(&mut self) {
        self.next.copy_from(&self.current);

        let size = self.current.size();
        for x in 0..size.width {
            for y in 0..size.height {
                self.push_cell(x, y);
            }
        }

        std::mem::swap(&mut self.current, &mut self.next);
        for pressure in self.current.as_mut_slice() {
            if !pressure.is_finite() || *pressure < 0.0 {
                *pressure = 0.0;
            }
        }
    }

    fn cell(&self, pos: GridPos) -> Option<WaterCell> {
        self.current.at(pos).map(WaterCell::with_pressure)
    }

    fn pressure_field(&self) -> Field<f32> {
        self.current.clone()
    }

    fn boundary_field(&self) -> Field<bool> {
        self.boundaries.clone()
    }
}
