//! # voxlabel
//!
//! Label extraction for 3D segmentation volumes.
//!
//! A dense [`VoxelGrid`] is converted into a sparse [`LabelMap`] made of run-length
//! [`LabelObject`]s, the requested labels are selected and merged, the merged map is
//! densified again and finally relabelled to a single output value.
//!
//! ```rust
//! use voxlabel::{Dimensions, Extraction, Geometry, VoxelGrid};
//!
//! let geometry = Geometry::new(Dimensions::new(4, 1, 1));
//! let grid = VoxelGrid::from_voxels(geometry, vec![1, 2, 3, 0]).unwrap();
//!
//! let extraction = Extraction::new(vec![1, 3], 9).unwrap();
//! let extracted = extraction.run(grid).unwrap();
//!
//! assert_eq!(extracted.grid.voxels(), &[9, 0, 9, 0]);
//! ```

pub mod core;
pub mod extract;
pub mod io;
pub mod label_map;
pub mod relabel;

pub use crate::core::{BACKGROUND, Dimensions, Geometry, GridError, Label, VoxelGrid};
pub use extract::{ExtractError, Extracted, Extraction, ExtractionReport, LabelMatch};
pub use io::{LoadError, VolumeFormat, WriteError, read_volume, write_volume};
pub use label_map::{
    LabelMap, LabelMapError, LabelObject, Run, ShapeAttributes,
    merge::{MergeError, MergePolicy, Merged, Provenance, merge},
};
pub use relabel::ChangeMap;
