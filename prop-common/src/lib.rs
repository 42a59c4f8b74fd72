pub mod config;
pub mod coord_ops;
pub mod export;
pub mod float_repr;
pub mod memory;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{CoordConfig, MemoryConfig, OutputConfig, OutputFormat, StageConfig, Step, TimingConfig, TrackDistance};
pub use coord_ops::{add, dist, divide, divisor, factor, multiply, subtract, Coord};
pub use memory::{CoordMemory, BLOCK_SIZE, PAGE_FLOATS};
pub use snapshot::{NamedPosition, Snapshot, TrackedDistance};
pub use vecmath::Vec2;
