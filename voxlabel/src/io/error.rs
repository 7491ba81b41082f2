use std::path::PathBuf;

use crate::GridError;

/// Errors raised while reading a volume.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported volume format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a VLM file")]
    BadMagic,

    #[error("unsupported VLM version {0:#06x}")]
    UnsupportedVersion(u16),

    #[error("unknown VLM flags {0:#06x}")]
    UnknownFlags(u16),

    #[error("VLM payload checksum mismatch")]
    ChecksumMismatch,

    #[error("corrupt VLM payload: {0}")]
    CorruptPayload(&'static str),

    #[cfg(feature = "nifti")]
    #[error("NIfTI error: {0}")]
    Nifti(#[from] ::nifti::NiftiError),

    #[error("expected a 3D volume, got shape {0:?}")]
    NotVolumetric(Vec<usize>),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors raised while writing a volume.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WriteError {
    #[error("cannot create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported volume format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("VLM payload of {0} bytes does not fit the container")]
    PayloadTooLarge(usize),

    #[cfg(feature = "nifti")]
    #[error("NIfTI error: {0}")]
    Nifti(#[from] ::nifti::NiftiError),

    #[cfg(feature = "nifti")]
    #[error("voxel buffer does not match the grid shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
