//! Tuning parameters shared by the water models
//!
//! None of these are physical constants. They were tuned by eye for
//! plausible-looking flow on small grids, so every one is configurable.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Flow and compression tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Velocity added to `y` every tick (negative pulls down)
    pub gravity: f32,
    /// Fraction of velocity lost every tick, in `[0, 1]`
    pub drag: f32,
    /// Scales the probability of committing to a move along the chosen axis
    pub velocity_multiplier: f32,
    /// Pressure of a full cell at rest
    pub max_pressure: f32,
    /// Cells below this pressure do not push and lose their velocity
    pub min_pressure: f32,
    /// Extra pressure a cell may hold per cell of water stacked above it
    pub max_compression: f32,
    /// Upper bound for a single directed or upward transfer
    pub max_flow: f32,
    /// Gain of the pressure-gradient push on velocity
    pub flow_gain: f32,
    /// Pressure-only model: flows above this are halved to damp oscillation
    pub min_flow: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            gravity: -0.1,
            drag: 0.1,
            velocity_multiplier: 1.0,
            max_pressure: 1.0,
            min_pressure: 0.001,
            max_compression: 0.25,
            max_flow: 1.25,
            flow_gain: 0.05,
            min_flow: 0.01,
        }
    }
}

impl FlowParams {
    /// Check every parameter is finite and inside its range
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("gravity", self.gravity),
            ("drag", self.drag),
            ("velocity_multiplier", self.velocity_multiplier),
            ("max_pressure", self.max_pressure),
            ("min_pressure", self.min_pressure),
            ("max_compression", self.max_compression),
            ("max_flow", self.max_flow),
            ("flow_gain", self.flow_gain),
            ("min_flow", self.min_flow),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter {
                    name,
                    value,
                    constraint: "must be finite",
                });
            }
        }

        if !(0.0..=1.0).contains(&self.drag) {
            return Err(SimError::InvalidParameter {
                name: "drag",
                value: self.drag,
                constraint: "must be within [0, 1]",
            });
        }
        if self.max_pressure <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "max_pressure",
                value: self.max_pressure,
                constraint: "must be positive",
            });
        }

        let non_negative = [
            ("velocity_multiplier", self.velocity_multiplier),
            ("min_pressure", self.min_pressure),
            ("max_compression", self.max_compression),
            ("max_flow", self.max_flow),
            ("min_flow", self.min_flow),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(SimError::InvalidParameter {
                    name,
                    value,
                    constraint: "must not be negative",
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(FlowParams::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range_drag() {
        let params = FlowParams {
            drag: 1.5,
            ..Default::default()
        };
        match params.validate() {
            Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, "drag"),
            other => panic!("expected drag rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_finite() {
        let params = FlowParams {
            gravity: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SimError::InvalidParameter {
                name: "gravity",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_negative_limits() {
        let params = FlowParams {
            max_flow: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SimError::InvalidParameter {
                name: "max_flow",
                ..
            })
        ));

        let params = FlowParams {
            max_pressure: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
