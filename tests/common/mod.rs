//! Fixtures shared by the integration tests
//!
//! Builds small but well-formed PE images (PE32+ with `.rsrc` as the only
//! section by default, or PE32 with code and data sections ahead of it),
//! plus the icon payloads and group directories that go into them.

#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

const RT_ICON: u16 = 3;
const RT_GROUP_ICON: u16 = 14;
const HIGH_BIT: u32 = 0x8000_0000;

const PE_OFFSET: usize = 0x80;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: usize = 0x1000;
const SECTION_HEADER_SIZE: usize = 40;
const IMPORT_DIRECTORY: usize = 1;
const RESOURCE_DIRECTORY: usize = 2;

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Name of an icon group
#[derive(Debug, Clone, Copy)]
pub enum Group {
    Id(u16),
    Name(&'static str),
}

/// Image flavour of a fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flavor {
    /// x64 PE32+ with `.rsrc` as its only section
    #[default]
    Pe32Plus,
    /// x86 PE32 with `.text` and `.rdata` ahead of `.rsrc`
    Pe32,
}

/// Icon groups and icon images to embed in a fixture
#[derive(Debug, Default)]
pub struct Resources {
    groups: Vec<(Group, Vec<u8>)>,
    icons: Vec<(u16, Vec<u8>)>,
    flavor: Flavor,
    import_directory: Option<(u32, u32)>,
}

impl Resources {
    pub fn group(mut self, name: Group, directory: Vec<u8>) -> Self {
        self.groups.push((name, directory));
        self
    }

    pub fn icon(mut self, id: u16, payload: Vec<u8>) -> Self {
        self.icons.push((id, payload));
        self
    }

    pub fn flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Point the import data directory at `rva`, mapped or not
    pub fn import_directory(mut self, rva: u32, size: u32) -> Self {
        self.import_directory = Some((rva, size));
        self
    }

    /// Write a PE image carrying these resources to `dir/name`
    pub fn write_exe(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.into_pe()).unwrap();
        path
    }

    fn into_pe(mut self) -> Vec<u8> {
        // Resource directories list string names first, then ids ascending
        self.groups.sort_by_key(|(name, _)| match name {
            Group::Name(text) => (0, 0, *text),
            Group::Id(id) => (1, *id, ""),
        });
        self.icons.sort_by_key(|(id, _)| *id);

        let mut types: Vec<(u16, Vec<(Group, &[u8])>)> = Vec::new();
        if !self.icons.is_empty() {
            types.push((
                RT_ICON,
                self.icons
                    .iter()
                    .map(|(id, data)| (Group::Id(*id), data.as_slice()))
                    .collect(),
            ));
        }
        if !self.groups.is_empty() {
            types.push((
                RT_GROUP_ICON,
                self.groups
                    .iter()
                    .map(|(name, data)| (*name, data.as_slice()))
                    .collect(),
            ));
        }

        let leading = match self.flavor {
            Flavor::Pe32Plus => Vec::new(),
            Flavor::Pe32 => vec![
                // int3 filler for code, zeros for read-only data
                Section::new(*b".text\0\0\0", vec![0xCC; 0x180], 0x6000_0020),
                Section::new(*b".rdata\0\0", vec![0; 0x40], 0x4000_0040),
            ],
        };
        let rsrc_rva = section_rva(leading.len());
        let mut sections = leading;
        sections.push(Section::new(
            *b".rsrc\0\0\0",
            rsrc_section(&types, rsrc_rva),
            0x4000_0040,
        ));

        let rsrc_size = offset(sections[sections.len() - 1].data.len());
        let mut directories = vec![(RESOURCE_DIRECTORY, rsrc_rva, rsrc_size)];
        if let Some((rva, size)) = self.import_directory {
            directories.push((IMPORT_DIRECTORY, rva, size));
        }
        pe_image(self.flavor, &sections, &directories)
    }
}

fn put16(out: &mut [u8], at: usize, value: u16) {
    out[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn offset(value: usize) -> u32 {
    u32::try_from(value).unwrap()
}

/// Append an `IMAGE_RESOURCE_DIRECTORY` with room for its entries
fn directory(out: &mut Vec<u8>, named: usize, ids: usize) {
    out.extend_from_slice(&[0; 12]);
    out.extend_from_slice(&u16::try_from(named).unwrap().to_le_bytes());
    out.extend_from_slice(&u16::try_from(ids).unwrap().to_le_bytes());
    out.resize(out.len() + 8 * (named + ids), 0);
}

/// Serialize a type → name → language tree; entry fields are patched in as
/// their targets get placed
fn rsrc_section(types: &[(u16, Vec<(Group, &[u8])>)], rsrc_rva: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut leaves: Vec<(usize, &[u8])> = Vec::new();
    let mut strings: Vec<(usize, &str)> = Vec::new();

    directory(&mut out, 0, types.len());
    for (t, (kind, entries)) in types.iter().enumerate() {
        let type_dir = out.len();
        put32(&mut out, 16 + 8 * t, u32::from(*kind));
        put32(&mut out, 16 + 8 * t + 4, HIGH_BIT | offset(type_dir));

        let named = entries
            .iter()
            .filter(|(name, _)| matches!(name, Group::Name(_)))
            .count();
        directory(&mut out, named, entries.len() - named);

        for (n, (name, data)) in entries.iter().enumerate() {
            let slot = type_dir + 16 + 8 * n;
            match name {
                Group::Id(id) => put32(&mut out, slot, u32::from(*id)),
                Group::Name(text) => strings.push((slot, *text)),
            }
            let language_dir = out.len();
            put32(&mut out, slot + 4, HIGH_BIT | offset(language_dir));
            directory(&mut out, 0, 1);
            put32(&mut out, language_dir + 16, 0x0409);
            leaves.push((language_dir + 20, *data));
        }
    }

    let mut data_entries = Vec::new();
    for (slot, data) in leaves {
        let entry = out.len();
        put32(&mut out, slot, offset(entry));
        out.extend_from_slice(&[0; 16]);
        data_entries.push((entry, data));
    }

    for (slot, text) in strings {
        let at = out.len();
        put32(&mut out, slot, HIGH_BIT | offset(at));
        let units: Vec<u16> = text.encode_utf16().collect();
        out.extend_from_slice(&u16::try_from(units.len()).unwrap().to_le_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }

    for (entry, data) in data_entries {
        out.resize(out.len().next_multiple_of(4), 0);
        let at = out.len();
        put32(&mut out, entry, rsrc_rva + offset(at));
        put32(&mut out, entry + 4, offset(data.len()));
        out.extend_from_slice(data);
    }
    out
}

/// One section of a fixture image
struct Section {
    name: [u8; 8],
    data: Vec<u8>,
    characteristics: u32,
}

impl Section {
    fn new(name: [u8; 8], data: Vec<u8>, characteristics: u32) -> Self {
        Self {
            name,
            data,
            characteristics,
        }
    }
}

/// RVA of the section at `index`; sections sit one alignment unit apart, so
/// only the last may outgrow 4 KiB
fn section_rva(index: usize) -> u32 {
    offset(SECTION_ALIGNMENT * (index + 1))
}

/// Minimal PE image of the given flavour; `directories` are
/// `(index, rva, size)` data directory entries
fn pe_image(flavor: Flavor, sections: &[Section], directories: &[(usize, u32, u32)]) -> Vec<u8> {
    let (optional_size, directory_start) = match flavor {
        Flavor::Pe32Plus => (240, 112),
        Flavor::Pe32 => (224, 96),
    };
    let section_table = PE_OFFSET + 24 + optional_size;
    let headers_size =
        (section_table + SECTION_HEADER_SIZE * sections.len()).next_multiple_of(FILE_ALIGNMENT);

    // Raw data placement, one after another past the headers
    let mut raw = Vec::new();
    let mut cursor = headers_size;
    for section in sections {
        let size = section.data.len().next_multiple_of(FILE_ALIGNMENT);
        raw.push((cursor, size));
        cursor += size;
    }
    let mut out = vec![0u8; cursor];

    // DOS header
    out[0..2].copy_from_slice(b"MZ");
    put32(&mut out, 0x3C, offset(PE_OFFSET));

    // COFF file header
    out[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
    let coff = PE_OFFSET + 4;
    let (machine, characteristics) = match flavor {
        Flavor::Pe32Plus => (0x8664, 0x0022), // AMD64; executable, large address aware
        Flavor::Pe32 => (0x014C, 0x0102),     // i386; executable, 32-bit machine
    };
    put16(&mut out, coff, machine);
    put16(&mut out, coff + 2, u16::try_from(sections.len()).unwrap());
    put16(&mut out, coff + 16, u16::try_from(optional_size).unwrap());
    put16(&mut out, coff + 18, characteristics);

    // Optional header: the fields up to the subsystem share offsets
    let opt = coff + 20;
    let initialized: usize = raw.iter().map(|(_, size)| size).sum();
    put32(&mut out, opt + 8, offset(initialized));
    put32(&mut out, opt + 32, offset(SECTION_ALIGNMENT));
    put32(&mut out, opt + 36, offset(FILE_ALIGNMENT));
    put16(&mut out, opt + 40, 6); // OS version
    put16(&mut out, opt + 48, 6); // subsystem version
    let last_rva = section_rva(sections.len() - 1) as usize;
    let last_size = sections[sections.len() - 1].data.len();
    put32(
        &mut out,
        opt + 56,
        offset(last_rva + last_size.next_multiple_of(SECTION_ALIGNMENT)),
    );
    put32(&mut out, opt + 60, offset(headers_size));
    put16(&mut out, opt + 68, 2); // GUI subsystem

    match flavor {
        Flavor::Pe32Plus => {
            put16(&mut out, opt, 0x20B);
            out[opt + 24..opt + 32].copy_from_slice(&0x1_4000_0000u64.to_le_bytes());
            out[opt + 72..opt + 80].copy_from_slice(&0x10_0000u64.to_le_bytes());
            out[opt + 80..opt + 88].copy_from_slice(&0x1000u64.to_le_bytes());
            out[opt + 88..opt + 96].copy_from_slice(&0x10_0000u64.to_le_bytes());
            out[opt + 96..opt + 104].copy_from_slice(&0x1000u64.to_le_bytes());
            put32(&mut out, opt + 108, 16); // data directories
        }
        Flavor::Pe32 => {
            put16(&mut out, opt, 0x10B);
            put32(&mut out, opt + 4, offset(raw[0].1)); // code
            put32(&mut out, opt + 20, section_rva(0)); // base of code
            put32(&mut out, opt + 24, section_rva(1)); // base of data
            put32(&mut out, opt + 28, 0x40_0000); // image base
            put32(&mut out, opt + 72, 0x10_0000);
            put32(&mut out, opt + 76, 0x1000);
            put32(&mut out, opt + 80, 0x10_0000);
            put32(&mut out, opt + 84, 0x1000);
            put32(&mut out, opt + 92, 16); // data directories
        }
    }
    for &(index, rva, size) in directories {
        let at = opt + directory_start + 8 * index;
        put32(&mut out, at, rva);
        put32(&mut out, at + 4, size);
    }

    // Section table and raw data
    for (i, (section, &(pointer, size))) in sections.iter().zip(&raw).enumerate() {
        let header = section_table + SECTION_HEADER_SIZE * i;
        out[header..header + 8].copy_from_slice(&section.name);
        put32(&mut out, header + 8, offset(section.data.len()));
        put32(&mut out, header + 12, section_rva(i));
        put32(&mut out, header + 16, offset(size));
        put32(&mut out, header + 20, offset(pointer));
        put32(&mut out, header + 36, section.characteristics);
        out[pointer..pointer + section.data.len()].copy_from_slice(&section.data);
    }
    out
}

/// `GRPICONDIR` with one entry per `(stored width, icon id)`
pub fn group_directory(entries: &[(u8, u16)]) -> Vec<u8> {
    let mut out = vec![0, 0, 1, 0];
    out.extend_from_slice(&u16::try_from(entries.len()).unwrap().to_le_bytes());
    for &(width, id) in entries {
        out.extend_from_slice(&[width, width, 0, 0]);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&32u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&id.to_le_bytes());
    }
    out
}

/// 32-bpp DIB icon payload, `size`×`size`, filled with `rgba`
pub fn dib_icon(size: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&i32::try_from(size).unwrap().to_le_bytes());
    out.extend_from_slice(&i32::try_from(size * 2).unwrap().to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&[0; 24]);
    let [r, g, b, a] = rgba;
    for _ in 0..size * size {
        out.extend_from_slice(&[b, g, r, a]);
    }
    let mask_len = size.div_ceil(32) * 4 * size;
    out.resize(out.len() + mask_len as usize, 0);
    out
}

/// PNG icon payload, `size`×`size`, filled with `rgba`
pub fn png_icon(size: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(size, size, Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A typical application: 16, 32, 48 DIBs and a 256 PNG under group 1
pub fn typical_app(dir: &Path, name: &str) -> PathBuf {
    Resources::default()
        .group(
            Group::Id(1),
            group_directory(&[(16, 1), (32, 2), (48, 3), (0, 4)]),
        )
        .icon(1, dib_icon(16, RED))
        .icon(2, dib_icon(32, RED))
        .icon(3, dib_icon(48, RED))
        .icon(4, png_icon(256, BLUE))
        .write_exe(dir, name)
}

/// A file with a launchable extension but plain text content
pub fn text_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "@echo off\r\necho not a binary\r\n").unwrap();
    path
}
