//! Shortcut target resolution
//!
//! On Windows a `.lnk` file is resolved by the shell itself through
//! `IShellLinkW`, which also handles advertised, relative and
//! environment-variable targets. Elsewhere the target is read straight out
//! of the Shell Link file: the header, the optional `LinkTargetIDList`
//! (skipped) and the `LinkInfo` block with its local base path and common
//! path suffix.

use crate::error::{Result, TileIconError};
use scroll::{LE, Pread};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const HEADER_SIZE: u32 = 0x4C;
/// `{00021401-0000-0000-C000-000000000046}` in on-disk byte order
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const HAS_LINK_TARGET_ID_LIST: u32 = 0x0000_0001;
const HAS_LINK_INFO: u32 = 0x0000_0002;
const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x0000_0001;
/// `LinkInfo` headers at least this long carry Unicode path offsets
const UNICODE_LINK_INFO_HEADER_SIZE: u32 = 0x24;

/// Turns shortcut paths into the paths they point at
pub trait ShortcutResolver: Send + Sync {
    /// Target of `path` if it is a shortcut, otherwise `path` itself
    ///
    /// Never fails: an unreadable shortcut resolves to the shortcut file.
    fn resolve_shortcut_target(&self, path: &Path) -> PathBuf;
}

/// Resolver backed by the platform's shell where there is one
#[cfg(windows)]
pub type PlatformResolver = ShellLinkResolver;
/// Resolver backed by the platform's shell where there is one
#[cfg(not(windows))]
pub type PlatformResolver = LnkResolver;

/// Shell Link file reader, independent of the host shell
#[derive(Debug, Default, Clone, Copy)]
pub struct LnkResolver;

impl ShortcutResolver for LnkResolver {
    fn resolve_shortcut_target(&self, path: &Path) -> PathBuf {
        resolve_with(path, read_link_file)
    }
}

/// Windows shell resolution through `IShellLinkW`
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLinkResolver;

#[cfg(windows)]
impl ShortcutResolver for ShellLinkResolver {
    fn resolve_shortcut_target(&self, path: &Path) -> PathBuf {
        resolve_with(path, native::shell_link_target)
    }
}

fn resolve_with(path: &Path, read: impl FnOnce(&Path) -> Result<PathBuf>) -> PathBuf {
    if !is_shortcut(path) {
        return path.to_path_buf();
    }
    match read(path) {
        Ok(target) => {
            debug!("Shortcut {:?} points to {:?}", path, target);
            target
        }
        Err(e) => {
            warn!("Using shortcut itself: {}", e);
            path.to_path_buf()
        }
    }
}

/// Whether `path` has a `.lnk` extension (any case)
pub fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"))
}

/// Target of the shortcut at `path`, resolved the platform's way
pub fn read_link_target(path: &Path) -> Result<PathBuf> {
    #[cfg(windows)]
    {
        native::shell_link_target(path)
    }
    #[cfg(not(windows))]
    {
        read_link_file(path)
    }
}

/// Read the local target path stored in the Shell Link file at `path`
pub fn read_link_file(path: &Path) -> Result<PathBuf> {
    let bytes = std::fs::read(path)?;
    parse_link_target(&bytes).map_err(|reason| TileIconError::ShortcutError {
        path: path.to_path_buf(),
        reason,
    })
}

/// Decode the target path from Shell Link bytes
fn parse_link_target(bytes: &[u8]) -> std::result::Result<PathBuf, String> {
    let truncated = |e: scroll::Error| format!("truncated shell link: {e}");

    let header_size: u32 = bytes.pread_with(0, LE).map_err(truncated)?;
    if header_size != HEADER_SIZE || bytes.get(4..20) != Some(&LINK_CLSID[..]) {
        return Err("not a shell link".to_string());
    }
    let flags: u32 = bytes.pread_with(0x14, LE).map_err(truncated)?;

    let mut offset = HEADER_SIZE as usize;
    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        let id_list_size: u16 = bytes.pread_with(offset, LE).map_err(truncated)?;
        offset += 2 + usize::from(id_list_size);
    }
    if flags & HAS_LINK_INFO == 0 {
        return Err("shell link has no LinkInfo".to_string());
    }

    let info = bytes.get(offset..).ok_or("LinkInfo beyond end of file")?;
    let info_size: u32 = info.pread_with(0, LE).map_err(truncated)?;
    let info = info
        .get(..info_size as usize)
        .ok_or("LinkInfo beyond end of file")?;

    let info_header_size: u32 = info.pread_with(4, LE).map_err(truncated)?;
    let info_flags: u32 = info.pread_with(8, LE).map_err(truncated)?;
    if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH == 0 {
        return Err("shell link target is not on a local volume".to_string());
    }

    let unicode_offsets = if info_header_size >= UNICODE_LINK_INFO_HEADER_SIZE {
        let base: u32 = info.pread_with(28, LE).map_err(truncated)?;
        let suffix: u32 = info.pread_with(32, LE).map_err(truncated)?;
        Some((base, suffix))
    } else {
        None
    };

    let target = match unicode_offsets {
        Some((base, suffix)) if base != 0 => {
            let mut target = utf16_string_at(info, base as usize)?;
            if suffix != 0 {
                target.push_str(&utf16_string_at(info, suffix as usize)?);
            }
            target
        }
        _ => {
            let base: u32 = info.pread_with(16, LE).map_err(truncated)?;
            let suffix: u32 = info.pread_with(24, LE).map_err(truncated)?;
            let mut target = ansi_string_at(info, base as usize)?;
            if suffix != 0 {
                target.push_str(&ansi_string_at(info, suffix as usize)?);
            }
            target
        }
    };

    if target.is_empty() {
        return Err("shell link has an empty target".to_string());
    }
    Ok(PathBuf::from(target))
}

/// NUL-terminated single-byte string
fn ansi_string_at(block: &[u8], offset: usize) -> std::result::Result<String, String> {
    let tail = block
        .get(offset..)
        .ok_or_else(|| format!("string offset {offset} out of bounds"))?;
    let end = tail
        .iter()
        .position(|b| *b == 0)
        .ok_or("unterminated string")?;
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

/// NUL-terminated UTF-16LE string
fn utf16_string_at(block: &[u8], offset: usize) -> std::result::Result<String, String> {
    let tail = block
        .get(offset..)
        .ok_or_else(|| format!("string offset {offset} out of bounds"))?;
    let units: Vec<u16> = tail
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    if units.len() * 2 >= tail.len() {
        return Err("unterminated string".to_string());
    }
    Ok(String::from_utf16_lossy(&units))
}

#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "COM shell link calls; the apartment is left by a guard on every path"
)]
mod native {
    use crate::error::{Result, TileIconError};
    use std::ffi::OsString;
    use std::os::windows::ffi::{OsStrExt, OsStringExt};
    use std::path::{Path, PathBuf};
    use windows::Win32::Foundation::MAX_PATH;
    use windows::Win32::System::Com::{
        CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx,
        CoUninitialize, IPersistFile, STGM_READ,
    };
    use windows::Win32::UI::Shell::{IShellLinkW, ShellLink};
    use windows::core::{HRESULT, Interface, PCWSTR};

    /// COM initialised on the calling thread until dropped
    ///
    /// A thread already in another apartment keeps it; only a successful
    /// initialisation is balanced with `CoUninitialize`.
    struct ComInit {
        hr: HRESULT,
    }

    impl ComInit {
        fn new() -> Self {
            let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
            Self { hr }
        }
    }

    impl Drop for ComInit {
        fn drop(&mut self) {
            if self.hr.is_ok() {
                unsafe { CoUninitialize() };
            }
        }
    }

    pub(super) fn shell_link_target(path: &Path) -> Result<PathBuf> {
        let failed = |reason: String| TileIconError::ShortcutError {
            path: path.to_path_buf(),
            reason,
        };
        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let _com = ComInit::new();
        let mut buffer = [0u16; MAX_PATH as usize];
        unsafe {
            let shell_link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)
                .map_err(|e| failed(format!("CoCreateInstance(ShellLink) failed: {e}")))?;
            let persist_file: IPersistFile = shell_link
                .cast()
                .map_err(|e| failed(format!("IPersistFile unavailable: {e}")))?;
            persist_file
                .Load(PCWSTR(wide_path.as_ptr()), STGM_READ)
                .map_err(|e| failed(format!("IPersistFile::Load failed: {e}")))?;
            shell_link
                .GetPath(&mut buffer, std::ptr::null_mut(), 0)
                .map_err(|e| failed(format!("IShellLinkW::GetPath failed: {e}")))?;
        }

        let len = buffer.iter().position(|unit| *unit == 0).unwrap_or(buffer.len());
        if len == 0 {
            return Err(failed("shell link has no file-system target".to_string()));
        }
        Ok(PathBuf::from(OsString::from_wide(&buffer[..len])))
    }
}
