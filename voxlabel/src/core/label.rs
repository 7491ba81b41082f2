/// Voxel label identifier.
///
/// Segmentation volumes store one unsigned 16-bit label per voxel.
pub type Label = u16;

/// The reserved label meaning "not part of any labelled region".
pub const BACKGROUND: Label = 0;
