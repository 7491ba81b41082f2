mod dimensions;
mod geometry;
mod grid;
mod label;

pub use dimensions::Dimensions;
pub use geometry::Geometry;
pub use grid::{GridError, VoxelGrid};
pub use label::{BACKGROUND, Label};
