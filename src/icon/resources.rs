//! PE resource tree walking
//!
//! The `.rsrc` data is a three-level tree (type → name → language) of
//! `IMAGE_RESOURCE_DIRECTORY` nodes ending in `IMAGE_RESOURCE_DATA_ENTRY`
//! leaves. The records themselves are goblin's `pe::resource` types; this
//! module adds the lookup rules of `FindResource` on top (string names,
//! `"#N"` names, first language) and resolves leaf RVAs through the section
//! table. A corrupt tree yields an error, never a panic.

use goblin::pe::options::ParseOptions;
use goblin::pe::resource::{
    ImageResourceDirectory, ResourceDataEntry, ResourceEntry, ResourceEntryIterator,
};
use goblin::pe::section_table::SectionTable;
use goblin::pe::utils::find_offset;
use scroll::{LE, Pread};
use std::fmt;

pub use goblin::pe::resource::{RT_GROUP_ICON, RT_ICON};

/// `IMAGE_RESOURCE_DIRECTORY` header; its entries follow it
const DIRECTORY_HEADER_SIZE: usize = 16;

/// Identifier of a resource type or name: a number or a UTF-16 string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceName {
    /// Numeric identifier (`MAKEINTRESOURCE`)
    Id(u16),
    /// String identifier
    Name(String),
}

impl ResourceName {
    /// Whether this name is what `FindResource` would match for `other`
    ///
    /// String names compare case-insensitively, and `"#12"` matches id 12.
    pub fn matches(&self, other: &ResourceName) -> bool {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => a == b,
            (Self::Name(a), Self::Name(b)) => a.eq_ignore_ascii_case(b),
            (Self::Id(id), Self::Name(name)) | (Self::Name(name), Self::Id(id)) => {
                parse_numeric_name(name) == Some(*id)
            }
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

fn parse_numeric_name(name: &str) -> Option<u16> {
    name.strip_prefix('#')?.parse().ok()
}

/// Why a tree walk failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A directory, entry or string lies outside the resource section
    OutOfBounds {
        /// Offset (relative to the resource root) that could not be read
        offset: usize,
    },
    /// A leaf's data is not backed by raw bytes of a single section
    UnmappedRva(u32),
    /// The requested node does not exist
    Missing,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { offset } => {
                write!(f, "resource directory read out of bounds at {offset:#x}")
            }
            Self::UnmappedRva(rva) => write!(f, "resource data RVA {rva:#x} is not mapped"),
            Self::Missing => f.write_str("resource not present"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Read-only view over a module's resource tree
#[derive(Debug, Clone, Copy)]
pub struct ResourceTree<'a> {
    image: &'a [u8],
    /// Image bytes from the resource root on; directory offsets are relative to it
    section: &'a [u8],
    sections: &'a [SectionTable],
    file_alignment: u32,
}

impl<'a> ResourceTree<'a> {
    /// Build a view over `image`, whose resource directory starts at file offset `root`
    pub fn new(
        image: &'a [u8],
        root: usize,
        sections: &'a [SectionTable],
        file_alignment: u32,
    ) -> Self {
        Self {
            image,
            section: image.get(root..).unwrap_or_default(),
            sections,
            file_alignment,
        }
    }

    /// Locate the first-language data of resource `name` of type `kind`
    ///
    /// The returned slice borrows the mapped image directly.
    pub fn find(&self, kind: u16, name: &ResourceName) -> Result<&'a [u8], TreeError> {
        let type_dir = self.type_directory(kind)?;
        let name_dir = self.child_directory(type_dir, name)?;
        let language = self
            .entries(name_dir)?
            .next()
            .ok_or(TreeError::Missing)?
            .map_err(|_| TreeError::OutOfBounds { offset: name_dir })?;
        let data_entry = language.offset_to_data().ok_or(TreeError::Missing)?;
        self.data(data_entry as usize)
    }

    /// All names under resource type `kind`, in directory order
    ///
    /// Directory order is string names first, then numeric ids ascending,
    /// which is also the order the OS enumerator reports them in. A module
    /// without the type yields an empty list.
    pub fn names(&self, kind: u16) -> Result<Vec<ResourceName>, TreeError> {
        let type_dir = match self.type_directory(kind) {
            Ok(offset) => offset,
            Err(TreeError::Missing) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        self.entries(type_dir)?
            .map(|entry| {
                entry
                    .map_err(|_| TreeError::OutOfBounds { offset: type_dir })
                    .and_then(|entry| self.entry_name(entry))
            })
            .collect()
    }

    fn type_directory(&self, kind: u16) -> Result<usize, TreeError> {
        let entry = self
            .entries(0)?
            .find_by_id(kind)
            .map_err(|_| TreeError::OutOfBounds { offset: 0 })?;
        subdirectory(entry)
    }

    fn child_directory(&self, directory: usize, wanted: &ResourceName) -> Result<usize, TreeError> {
        let entries = self.entries(directory)?;
        let corrupt = |_| TreeError::OutOfBounds { offset: directory };

        if let ResourceName::Id(id) = wanted {
            return subdirectory(entries.find_by_id(*id).map_err(corrupt)?);
        }
        for entry in entries {
            let entry = entry.map_err(corrupt)?;
            if self.entry_name(entry)?.matches(wanted) {
                return subdirectory(Some(entry));
            }
        }
        Err(TreeError::Missing)
    }

    /// Entries of the directory node at `offset`, after checking they all fit
    fn entries(&self, offset: usize) -> Result<ResourceEntryIterator<'a>, TreeError> {
        let out_of_bounds = || TreeError::OutOfBounds { offset };
        // IMAGE_RESOURCE_DIRECTORY: 12 bytes of stamps, then the two entry counts
        let named = self.read_u16(offset + 12).map_err(|_| out_of_bounds())?;
        let ids = self.read_u16(offset + 14).map_err(|_| out_of_bounds())?;
        if named.checked_add(ids).is_none() {
            return Err(out_of_bounds());
        }
        let directory = ImageResourceDirectory {
            number_of_named_entries: named,
            number_of_id_entries: ids,
            ..ImageResourceDirectory::default()
        };

        let first = offset + DIRECTORY_HEADER_SIZE;
        if first + directory.entries_size() > self.section.len() {
            return Err(out_of_bounds());
        }
        directory.next_iter(first, self.section).map_err(|_| out_of_bounds())
    }

    fn entry_name(&self, entry: ResourceEntry) -> Result<ResourceName, TreeError> {
        if let Some(id) = entry.id() {
            return Ok(ResourceName::Id(id));
        }

        // IMAGE_RESOURCE_DIR_STRING_U: length in UTF-16 units, then the units
        let at = entry.name_offset() as usize;
        let length = self.read_u16(at)?;
        let units = (0..usize::from(length))
            .map(|i| self.read_u16(at + 2 + i * 2))
            .collect::<Result<Vec<u16>, _>>()?;
        Ok(ResourceName::Name(String::from_utf16_lossy(&units)))
    }

    fn data(&self, data_entry: usize) -> Result<&'a [u8], TreeError> {
        let entry = ResourceDataEntry {
            offset_to_data: self.read_u32(data_entry)?,
            size: self.read_u32(data_entry + 4)?,
            ..ResourceDataEntry::default()
        };
        let rva = entry.offset_to_data;
        let unmapped = TreeError::UnmappedRva(rva);

        let start = self.file_offset(rva as usize).ok_or(unmapped.clone())?;
        if entry.size == 0 {
            return Ok(&[]);
        }
        // The last byte must resolve through the same section's raw data,
        // otherwise the payload runs into a zero-filled tail or another section
        let last_rva = (rva as usize).checked_add(entry.size as usize - 1);
        let last = last_rva.and_then(|last| self.file_offset(last));
        let end = start.checked_add(entry.size as usize);
        match (last, end) {
            (Some(last), Some(end)) if last + 1 == end => self
                .image
                .get(start..end)
                .ok_or(TreeError::OutOfBounds { offset: data_entry }),
            _ => Err(unmapped),
        }
    }

    fn file_offset(&self, rva: usize) -> Option<usize> {
        find_offset(
            rva,
            self.sections,
            self.file_alignment,
            &ParseOptions::default(),
        )
    }

    fn read_u32(&self, offset: usize) -> Result<u32, TreeError> {
        self.section
            .pread_with::<u32>(offset, LE)
            .map_err(|_| TreeError::OutOfBounds { offset })
    }

    fn read_u16(&self, offset: usize) -> Result<u16, TreeError> {
        self.section
            .pread_with::<u16>(offset, LE)
            .map_err(|_| TreeError::OutOfBounds { offset })
    }
}

/// Directory offset an entry points to; leaves and absent entries are missing
fn subdirectory(entry: Option<ResourceEntry>) -> Result<usize, TreeError> {
    match entry {
        Some(entry) if entry.data_is_directory() => Ok(entry.offset_to_directory() as usize),
        _ => Err(TreeError::Missing),
    }
}
