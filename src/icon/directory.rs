//! Icon group directory parsing
//!
//! An `RT_GROUP_ICON` resource is a `GRPICONDIR`: a 6-byte header
//! (reserved, type, count) followed by `count` packed 14-byte
//! `GRPICONDIRENTRY` records, all little-endian.

use crate::error::ExtractionError;
use scroll::{LE, Pread};
use smallvec::SmallVec;
use tracing::debug;

/// Size of the `GRPICONDIR` header
pub const GROUP_HEADER_SIZE: usize = 6;
/// Size of one packed `GRPICONDIRENTRY`
pub const GROUP_ENTRY_SIZE: usize = 14;

/// Largest edge an icon directory can describe; stored as 0
pub const MAX_ICON_DIMENSION: u32 = 256;

/// One icon variant described by an icon group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconDirEntry {
    /// Stored width (0 means 256)
    pub width: u8,
    /// Stored height (0 means 256)
    pub height: u8,
    /// Palette size, 0 for true colour
    pub color_count: u8,
    /// Reserved, normally 0
    pub reserved: u8,
    /// Colour planes
    pub planes: u16,
    /// Bits per pixel
    pub bit_count: u16,
    /// Byte size of the matching `RT_ICON` resource
    pub bytes_in_res: u32,
    /// Id of the matching `RT_ICON` resource
    pub id: u16,
}

impl IconDirEntry {
    /// Edge length used for selection: the stored width, with 0 read as 256
    pub fn dimension(&self) -> u32 {
        if self.width == 0 {
            MAX_ICON_DIMENSION
        } else {
            u32::from(self.width)
        }
    }

    fn read(bytes: &[u8], offset: usize) -> Result<Self, scroll::Error> {
        Ok(Self {
            width: bytes.pread_with(offset, LE)?,
            height: bytes.pread_with(offset + 1, LE)?,
            color_count: bytes.pread_with(offset + 2, LE)?,
            reserved: bytes.pread_with(offset + 3, LE)?,
            planes: bytes.pread_with(offset + 4, LE)?,
            bit_count: bytes.pread_with(offset + 6, LE)?,
            bytes_in_res: bytes.pread_with(offset + 8, LE)?,
            id: bytes.pread_with(offset + 12, LE)?,
        })
    }
}

/// Entries of one icon group, in resource order
pub type IconDirectory = SmallVec<[IconDirEntry; 8]>;

/// Parse a raw `RT_GROUP_ICON` resource
///
/// Fails with `MalformedDirectory` when the resource cannot hold the header
/// or the entry count it declares. Trailing bytes are ignored.
pub fn parse_group_directory(bytes: &[u8]) -> Result<IconDirectory, ExtractionError> {
    let declared: u16 = bytes
        .pread_with(4, LE)
        .map_err(|_| ExtractionError::MalformedDirectory {
            declared: 0,
            required: GROUP_HEADER_SIZE,
            available: bytes.len(),
        })?;

    let required = GROUP_HEADER_SIZE + usize::from(declared) * GROUP_ENTRY_SIZE;
    if bytes.len() < required {
        return Err(ExtractionError::MalformedDirectory {
            declared,
            required,
            available: bytes.len(),
        });
    }

    let kind: u16 = bytes.pread_with(2, LE).unwrap_or_default();
    if kind != 1 {
        debug!("Icon group directory has type {kind}, expected 1");
    }

    (0..usize::from(declared))
        .map(|index| {
            IconDirEntry::read(bytes, GROUP_HEADER_SIZE + index * GROUP_ENTRY_SIZE).map_err(
                |_| ExtractionError::MalformedDirectory {
                    declared,
                    required,
                    available: bytes.len(),
                },
            )
        })
        .collect()
}
