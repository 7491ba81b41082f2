//! Volume reading and writing.
//!
//! The file format is picked from the path: `.vlm` is the native run-length container,
//! `.nii` and `.nii.gz` are NIfTI-1 volumes.

mod error;

pub use error::{LoadError, WriteError};

#[cfg(feature = "vlm")]
pub mod consts;
#[cfg(feature = "vlm")]
pub mod export;
#[cfg(feature = "vlm")]
pub mod flags;
#[cfg(feature = "vlm")]
pub mod import;
#[cfg(feature = "nifti")]
pub mod nii;
#[cfg(feature = "vlm")]
pub mod varint;

#[cfg(feature = "vlm")]
pub use flags::Flags;

use std::path::Path;

use log::info;

use crate::VoxelGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeFormat {
    Vlm,
    Nifti,
    NiftiGz,
}

impl VolumeFormat {
    /// Detects the format from the file name, ignoring case.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();

        if name.ends_with(".nii.gz") {
            Some(Self::NiftiGz)
        } else if name.ends_with(".nii") {
            Some(Self::Nifti)
        } else if name.ends_with(".vlm") {
            Some(Self::Vlm)
        } else {
            None
        }
    }
}

/// Reads a labelled volume from `path`.
///
/// # Errors
/// - [`LoadError::UnsupportedFormat`] if the extension is not recognised.
/// - Any decoding error of the detected format.
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<VoxelGrid, LoadError> {
    let path = path.as_ref();
    let format = VolumeFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;

    let grid = match format {
        #[cfg(feature = "vlm")]
        VolumeFormat::Vlm => import::import_grid_from_vlm(path)?,
        #[cfg(feature = "nifti")]
        VolumeFormat::Nifti | VolumeFormat::NiftiGz => nii::import_grid_from_nifti(path)?,
        #[allow(unreachable_patterns)]
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    info!("Loaded {} ({:?}, {})", path.display(), format, grid.dims());

    Ok(grid)
}

/// Writes `grid` to `path` and returns the size of the written file.
///
/// # Errors
/// - [`WriteError::UnsupportedFormat`] if the extension is not recognised.
/// - Any I/O or encoding error. A partially written file is left in place.
pub fn write_volume<P: AsRef<Path>>(path: P, grid: &VoxelGrid) -> Result<u64, WriteError> {
    let path = path.as_ref();
    let format = VolumeFormat::from_path(path)
        .ok_or_else(|| WriteError::UnsupportedFormat(path.to_path_buf()))?;

    let written = match format {
        #[cfg(feature = "vlm")]
        VolumeFormat::Vlm => export::export_grid_to_vlm(path, grid)?,
        #[cfg(feature = "nifti")]
        VolumeFormat::Nifti | VolumeFormat::NiftiGz => nii::export_grid_to_nifti(path, grid)?,
        #[allow(unreachable_patterns)]
        _ => return Err(WriteError::UnsupportedFormat(path.to_path_buf())),
    };

    info!(
        "Wrote {} ({})",
        path.display(),
        humanize_bytes::humanize_bytes_binary!(written)
    );

    Ok(written)
}
