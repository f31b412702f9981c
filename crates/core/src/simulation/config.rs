//! Simulation configuration
//!
//! Everything here is plain serde data so a driver can load it from a file
//! and override single fields from the command line.

use crate::error::SimError;
use crate::solver::{Dispatch, FlowParams};
use serde::{Deserialize, Serialize};

/// Which cellular automaton runs the water
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Model {
    /// Discrete falling water, each cell is either full or empty
    Falling,
    /// Serial pressure-only push flow
    Pressure,
    /// Pressure + velocity on banded worker threads
    #[default]
    PressureVelocity,
}

impl Model {
    /// Short name for logs
    pub fn name(self) -> &'static str {
        match self {
            Model::Falling => "falling",
            Model::Pressure => "pressure",
            Model::PressureVelocity => "pressure-velocity",
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Water model
    pub model: Model,
    /// How the pressure-velocity model hands work to threads
    pub dispatch: Dispatch,
    /// Worker threads; `None` uses the hardware concurrency
    pub threads: Option<usize>,
    /// Base seed for every random stream
    pub seed: u64,
    /// Flow tuning
    pub params: FlowParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            model: Model::default(),
            dispatch: Dispatch::default(),
            threads: None,
            seed: 0x5EED,
            params: FlowParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Check the thread count and every flow parameter
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.threads == Some(0) {
            return Err(SimError::InvalidThreadCount);
        }
        self.params.validate()
    }
}
