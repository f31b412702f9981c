//! Grid store: coordinates, cells, double buffers and field snapshots

pub mod cells;
pub mod field;
pub mod position;

// Re-export main types
pub use cells::{CellBuffers, Vec2, WaterCell};
pub use field::Field;
pub use position::{Direction, GridPos, GridSize};
