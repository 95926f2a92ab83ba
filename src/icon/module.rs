//! Binary resource locator
//!
//! Opens a file as a data-only module: the file is mapped read-only, its
//! headers are checked to be a PE image, and it is reduced to what resource
//! lookups need (the resource directory offset, the section table and the
//! file alignment). Imports, exports, relocations and debug data are never
//! read, so damage there does not hide the icons. No code is loaded or run.

use crate::error::{ExtractionError, StringError};
use crate::icon::resources::{RT_GROUP_ICON, RT_ICON, ResourceName, ResourceTree, TreeError};
use crate::icon::tracking::{HandleKind, HandleToken};
use goblin::pe::header::{Header, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};
use goblin::pe::options::ParseOptions;
use goblin::pe::section_table::SectionTable;
use goblin::pe::utils::find_offset;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Conventional id of an application's main icon group
pub const CONVENTIONAL_GROUP_ID: u16 = 1;

/// A PE file mapped read-only as a resource container
///
/// Owns the mapping; dropping the module unmaps the file. Borrowed resource
/// slices cannot outlive it.
#[derive(Debug)]
pub struct MappedModule {
    path: PathBuf,
    map: Mmap,
    layout: ResourceLayout,
    _token: HandleToken,
}

impl MappedModule {
    /// Map `path` and validate it as a PE image
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let file = File::open(path).map_err(|e| ExtractionError::resource_access(path, e))?;
        let map = map_read_only(&file).map_err(|e| ExtractionError::resource_access(path, e))?;
        let token = HandleToken::acquire(HandleKind::Module);

        let layout =
            resource_layout(&map).map_err(|e| ExtractionError::resource_access(path, e))?;

        debug!(
            "Mapped {:?} ({} bytes, {} sections, resources: {})",
            path,
            map.len(),
            layout.sections.len(),
            layout.root.is_some()
        );

        Ok(Self {
            path: path.to_path_buf(),
            map,
            layout,
            _token: token,
        })
    }

    /// Path the module was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resource tree of the module, if it has a resource directory
    pub fn resources(&self) -> Option<ResourceTree<'_>> {
        let layout = &self.layout;
        layout.root.map(|root| {
            ResourceTree::new(&self.map, root, &layout.sections, layout.file_alignment)
        })
    }

    /// Names of all resources of type `kind`, in enumeration order
    pub fn enum_resource_names(&self, kind: u16) -> Result<Vec<ResourceName>, ExtractionError> {
        match self.resources() {
            Some(tree) => tree
                .names(kind)
                .map_err(|e| ExtractionError::resource_access(&self.path, e)),
            None => Ok(Vec::new()),
        }
    }

    /// Raw bytes of the icon group used for the application icon
    ///
    /// Tries group id 1 first; when that is absent, falls back to the first
    /// enumerated icon group.
    pub fn locate_icon_group(&self) -> Result<&[u8], ExtractionError> {
        let not_found = || ExtractionError::IconGroupNotFound {
            path: self.path.clone(),
        };
        let tree = self.resources().ok_or_else(not_found)?;

        match tree.find(RT_GROUP_ICON, &ResourceName::Id(CONVENTIONAL_GROUP_ID)) {
            Ok(bytes) => return Ok(bytes),
            Err(TreeError::Missing) => {}
            Err(e) => return Err(ExtractionError::resource_access(&self.path, e)),
        }

        let names = self.enum_resource_names(RT_GROUP_ICON)?;
        let first = names.first().ok_or_else(not_found)?;
        debug!("Icon group #1 absent in {:?}, using {}", self.path, first);

        tree.find(RT_GROUP_ICON, first).map_err(|e| match e {
            TreeError::Missing => not_found(),
            other => ExtractionError::resource_access(&self.path, other),
        })
    }

    /// Raw `RT_ICON` payload with resource id `id`
    pub fn icon_image(&self, id: u16) -> Result<&[u8], ExtractionError> {
        let tree = self
            .resources()
            .ok_or(ExtractionError::IconResourceNotFound { id })?;
        tree.find(RT_ICON, &ResourceName::Id(id))
            .map_err(|e| match e {
                TreeError::Missing => ExtractionError::IconResourceNotFound { id },
                other => ExtractionError::resource_access(&self.path, other),
            })
    }
}

#[expect(
    unsafe_code,
    reason = "Memory-mapping a file is unsafe because another process could truncate it; the map is read-only and every access is bounds-checked"
)]
fn map_read_only(file: &File) -> std::io::Result<Mmap> {
    // SAFETY: the mapping is never written through, and all reads go through
    // slice indexing or scroll reads that check bounds against the map length.
    unsafe { Mmap::map(file) }
}

/// What resource lookups need from the headers
#[derive(Debug)]
struct ResourceLayout {
    /// File offset of the root resource directory, if the image has one
    root: Option<usize>,
    sections: Vec<SectionTable>,
    file_alignment: u32,
}

/// Read the DOS, COFF and optional headers plus the section table
///
/// Mirrors a data-file load: only the headers and the resource data
/// directory are interpreted.
fn resource_layout(image: &[u8]) -> Result<ResourceLayout, Box<dyn std::error::Error + Send + Sync>> {
    let header = Header::parse(image)?;
    let Some(optional_header) = header.optional_header else {
        return Err(StringError::new("PE image has no optional header"));
    };
    let file_alignment = optional_header.windows_fields.file_alignment;
    if !file_alignment.is_power_of_two() {
        return Err(StringError::new(format!(
            "PE image has invalid file alignment {file_alignment:#x}"
        )));
    }

    let mut offset = header.dos_header.pe_pointer as usize
        + SIZEOF_PE_MAGIC
        + SIZEOF_COFF_HEADER
        + usize::from(header.coff_header.size_of_optional_header);
    let sections = header.coff_header.sections(image, &mut offset)?;

    let root = match optional_header.data_directories.get_resource_table() {
        Some(table) if table.virtual_address != 0 && table.size != 0 => {
            let root = find_offset(
                table.virtual_address as usize,
                &sections,
                file_alignment,
                &ParseOptions::default(),
            )
            .filter(|root| *root < image.len())
            .ok_or_else(|| StringError::new("resource directory lies outside every section"))?;
            Some(root)
        }
        _ => None,
    };

    Ok(ResourceLayout {
        root,
        sections,
        file_alignment,
    })
}
