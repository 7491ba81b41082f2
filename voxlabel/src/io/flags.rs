use bitflags::bitflags;

use super::LoadError;

bitflags! {
  /// Header flags of a VLM container.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct Flags: u16 {
    /// Payload is zstd compressed.
    const COMPRESSED = 1 << 0;
  }
}

impl Flags {
    /// Flags of files written by [`write_volume`](crate::write_volume).
    pub const DEFAULT: Self = Self::COMPRESSED;

    /// Parses the header field, rejecting bits this version does not define.
    pub fn from_header(bits: u16) -> Result<Self, LoadError> {
        Self::from_bits(bits).ok_or(LoadError::UnknownFlags(bits))
    }
}
