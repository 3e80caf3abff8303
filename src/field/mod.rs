pub mod lattice;
pub mod voxel_field;

pub use lattice::{Dimensions, Direction, DIRECTIONS};
pub use voxel_field::{CellSample, VoxelField};
