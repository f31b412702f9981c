//! Construction and configuration errors
//!
//! Running a simulation never fails: out-of-range edits are ignored and
//! numerical noise is clamped. Only building one can be rejected.

/// Errors that can occur when creating a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Width or height is zero, or the cell count does not fit in memory
    InvalidDimensions {
        /// Requested width in cells
        width: usize,
        /// Requested height in cells
        height: usize,
    },
    /// A tuning parameter is outside its valid range
    InvalidParameter {
        /// Parameter name as it appears in `FlowParams`
        name: &'static str,
        /// Offending value
        value: f32,
        /// Description of the constraint
        constraint: &'static str,
    },
    /// Requested worker count of zero
    InvalidThreadCount,
    /// The operating system refused to start a worker thread
    WorkerSpawn {
        /// Error reported by the OS
        reason: String,
    },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidDimensions { width, height } => {
                write!(f, "Invalid grid dimensions {width}x{height}")
            }
            SimError::InvalidParameter {
                name,
                value,
                constraint,
            } => write!(f, "Parameter {name} {constraint}, got {value}"),
            SimError::InvalidThreadCount => write!(f, "Thread count must be at least 1"),
            SimError::WorkerSpawn { reason } => write!(f, "Failed to spawn worker thread: {reason}"),
        }
    }
}

impl std::error::Error for SimError {}
