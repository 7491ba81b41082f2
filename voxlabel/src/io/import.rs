use std::{io::Read, path::Path};

use byteorder::{BigEndian, ReadBytesExt};
use glam::{Mat3, Vec3};
use log::debug;
use md5::{Digest, Md5};

use crate::{Dimensions, Geometry, Label, VoxelGrid};

use super::{
    Flags, LoadError,
    consts::{VLM_MAGIC, VLM_VERSION},
    varint::decode_varint,
};

pub fn import_grid_from_vlm<P: AsRef<Path>>(path: P) -> Result<VoxelGrid, LoadError> {
    let path = path.as_ref();
    let vlm_file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = std::io::BufReader::new(vlm_file);

    read_vlm(&mut reader)
}

/// Decodes a VLM container from `reader`.
pub fn read_vlm<R: Read>(reader: &mut R) -> Result<VoxelGrid, LoadError> {
    let mut magic = [0u8; VLM_MAGIC.len()];
    reader.read_exact(&mut magic)?;
    if magic != VLM_MAGIC {
        return Err(LoadError::BadMagic);
    }

    let version = reader.read_u16::<BigEndian>()?;
    if version != VLM_VERSION {
        return Err(LoadError::UnsupportedVersion(version));
    }

    let flags = reader.read_u16::<BigEndian>()?;
    let flags = Flags::from_header(flags)?;

    let _reserved_1 = reader.read_u32::<BigEndian>()?;
    let _reserved_2 = reader.read_u32::<BigEndian>()?;

    let size_x = reader.read_u32::<BigEndian>()?;
    let size_y = reader.read_u32::<BigEndian>()?;
    let size_z = reader.read_u32::<BigEndian>()?;
    let dims = Dimensions::new(size_x, size_y, size_z);
    let len = dims
        .checked_len()
        .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<Label>())
        .ok_or(LoadError::CorruptPayload("grid dimensions overflow"))?;

    let spacing = read_vec3(reader)?;
    let origin = read_vec3(reader)?;
    let rows = [read_vec3(reader)?, read_vec3(reader)?, read_vec3(reader)?];
    let direction = Mat3::from_cols(rows[0], rows[1], rows[2]).transpose();

    let geometry = Geometry::new(dims)
        .with_spacing(spacing)
        .with_origin(origin)
        .with_direction(direction);

    let mut md5_hash = [0u8; 16];
    reader.read_exact(&mut md5_hash)?;

    // The length field is not trusted for allocation; a short payload is an EOF.
    let data_size = reader.read_u32::<BigEndian>()?;
    let mut data = Vec::new();
    reader.by_ref().take(data_size as u64).read_to_end(&mut data)?;
    if data.len() != data_size as usize {
        return Err(LoadError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }

    let data = if flags.contains(Flags::COMPRESSED) {
        let mut decoder = zstd::stream::Decoder::new(&data[..])?;
        let mut decompressed = Vec::new();
        std::io::copy(&mut decoder, &mut decompressed)?;
        decompressed
    } else {
        data
    };

    let mut md5_hasher = Md5::new();
    md5_hasher.update(&data);
    let md5_hash_calculated = md5_hasher.finalize();

    if md5_hash != md5_hash_calculated.as_slice() {
        return Err(LoadError::ChecksumMismatch);
    }

    let voxels = decode_runs(&data, len)?;

    debug!(
        "Decoded VLM grid {dims} ({} payload bytes, flags {flags:?})",
        data.len()
    );

    Ok(VoxelGrid::from_voxels(geometry, voxels)?)
}

fn read_vec3<R: Read>(reader: &mut R) -> std::io::Result<Vec3> {
    let x = reader.read_f32::<BigEndian>()?;
    let y = reader.read_f32::<BigEndian>()?;
    let z = reader.read_f32::<BigEndian>()?;

    Ok(Vec3::new(x, y, z))
}

/// Expands `(label, run length)` varint pairs into exactly `len` voxels.
fn decode_runs(data: &[u8], len: usize) -> Result<Vec<Label>, LoadError> {
    // Grows with the decoded runs only, never with the header extent.
    let mut voxels = Vec::new();
    let mut iter = data.iter();

    while voxels.len() < len {
        let label = decode_varint(&mut iter).ok_or(LoadError::CorruptPayload("truncated run"))?;
        let run = decode_varint(&mut iter).ok_or(LoadError::CorruptPayload("truncated run"))?;

        let label =
            Label::try_from(label).map_err(|_| LoadError::CorruptPayload("label out of range"))?;
        if run == 0 {
            return Err(LoadError::CorruptPayload("empty run"));
        }
        if run > (len - voxels.len()) as u64 {
            return Err(LoadError::CorruptPayload("runs exceed the grid"));
        }

        voxels
            .try_reserve(run as usize)
            .map_err(|_| LoadError::CorruptPayload("grid too large to allocate"))?;
        voxels.resize(voxels.len() + run as usize, label);
    }

    if iter.next().is_some() {
        return Err(LoadError::CorruptPayload("trailing bytes after the last run"));
    }

    Ok(voxels)
}
