//! Associated-icon lookup
//!
//! The second fallback tier: ask the shell for whatever icon it would show
//! for the file. On Windows this goes through `SHGetFileInfoW`; elsewhere
//! there is no shell association to ask and the lookup reports that.

use crate::error::ExtractionError;
use image::RgbaImage;
use std::path::Path;

/// Source of a file's default associated icon
///
/// Implementations must be usable from several threads at once, since a
/// folder scan may extract icons in parallel.
pub trait AssociatedIconProvider: Send + Sync + std::fmt::Debug {
    /// Icon the platform associates with `path`, as an RGBA bitmap
    fn associated_icon(&self, path: &Path) -> Result<RgbaImage, ExtractionError>;
}

/// Shell-backed provider (`SHGetFileInfoW` on Windows)
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellAssociation;

impl AssociatedIconProvider for ShellAssociation {
    fn associated_icon(&self, path: &Path) -> Result<RgbaImage, ExtractionError> {
        #[cfg(windows)]
        {
            native::shell_file_icon(path)
        }

        #[cfg(not(windows))]
        {
            Err(ExtractionError::AssociationUnavailable {
                path: path.to_path_buf(),
                reason: "shell icon associations are only available on Windows".to_string(),
            })
        }
    }
}

#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Win32 shell and GDI calls; every handle is owned by a guard that releases it exactly once"
)]
mod native {
    use crate::error::{ExtractionError, StringError};
    use crate::icon::tracking::{HandleKind, HandleToken};
    use image::RgbaImage;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use tracing::debug;
    use windows::Win32::Graphics::Gdi::{
        BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, DIB_RGB_COLORS,
        DeleteDC, DeleteObject, GetDIBits, GetObjectW, HBITMAP, HDC, HGDIOBJ, SelectObject,
    };
    use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
    use windows::Win32::UI::Shell::{SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGetFileInfoW};
    use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};
    use windows::core::PCWSTR;

    /// An `HICON` destroyed when dropped
    pub(super) struct OwnedIcon {
        handle: HICON,
        _token: HandleToken,
    }

    impl OwnedIcon {
        fn new(handle: HICON) -> Option<Self> {
            (!handle.is_invalid()).then(|| Self {
                handle,
                _token: HandleToken::acquire(HandleKind::Icon),
            })
        }
    }

    impl Drop for OwnedIcon {
        fn drop(&mut self) {
            unsafe {
                let _ = DestroyIcon(self.handle);
            }
        }
    }

    /// Colour and mask bitmaps returned by `GetIconInfo`, deleted when dropped
    struct IconBitmaps {
        color: HBITMAP,
        mask: HBITMAP,
    }

    impl Drop for IconBitmaps {
        fn drop(&mut self) {
            unsafe {
                if !self.color.is_invalid() {
                    let _ = DeleteObject(self.color.into());
                }
                if !self.mask.is_invalid() {
                    let _ = DeleteObject(self.mask.into());
                }
            }
        }
    }

    /// Memory DC with a bitmap selected into it, restored and deleted when dropped
    struct SelectedDc {
        hdc: HDC,
        previous: HGDIOBJ,
    }

    impl Drop for SelectedDc {
        fn drop(&mut self) {
            unsafe {
                let _ = SelectObject(self.hdc, self.previous);
                let _ = DeleteDC(self.hdc);
            }
        }
    }

    /// Wrap the calling thread's last Win32 error
    fn construction_error(call: &str) -> ExtractionError {
        let last = windows::core::Error::from_thread();
        ExtractionError::IconConstruction(StringError::new(format!("{call} failed: {last}")))
    }

    pub(super) fn shell_file_icon(path: &Path) -> Result<RgbaImage, ExtractionError> {
        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let icon = unsafe {
            let mut file_info: SHFILEINFOW = std::mem::zeroed();
            let result = SHGetFileInfoW(
                PCWSTR(wide_path.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut file_info),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_ICON | SHGFI_LARGEICON,
            );
            if result == 0 {
                return Err(ExtractionError::AssociationUnavailable {
                    path: path.to_path_buf(),
                    reason: "SHGetFileInfoW returned no icon".to_string(),
                });
            }
            OwnedIcon::new(file_info.hIcon).ok_or_else(|| {
                ExtractionError::AssociationUnavailable {
                    path: path.to_path_buf(),
                    reason: "SHGetFileInfoW returned a null icon".to_string(),
                }
            })?
        };

        debug!("Shell associated icon obtained for {:?}", path);
        icon_to_image(&icon)
    }

    /// Convert an icon to RGBA at its own size
    pub(super) fn icon_to_image(icon: &OwnedIcon) -> Result<RgbaImage, ExtractionError> {
        unsafe {
            let mut icon_info: ICONINFO = std::mem::zeroed();
            if GetIconInfo(icon.handle, &mut icon_info).is_err() {
                return Err(construction_error("GetIconInfo"));
            }
            let bitmaps = IconBitmaps {
                color: icon_info.hbmColor,
                mask: icon_info.hbmMask,
            };
            if bitmaps.color.is_invalid() {
                return Err(ExtractionError::IconConstruction(StringError::new(
                    "monochrome icons have no colour bitmap",
                )));
            }

            let mut bitmap: BITMAP = std::mem::zeroed();
            if GetObjectW(
                bitmaps.color.into(),
                std::mem::size_of::<BITMAP>() as i32,
                Some(&mut bitmap as *mut BITMAP as *mut _),
            ) == 0
            {
                return Err(construction_error("GetObjectW"));
            }
            let width = bitmap.bmWidth.unsigned_abs();
            let height = bitmap.bmHeight.unsigned_abs();

            let hdc = CreateCompatibleDC(None);
            if hdc.is_invalid() {
                return Err(construction_error("CreateCompatibleDC"));
            }
            let dc = SelectedDc {
                hdc,
                previous: SelectObject(hdc, bitmaps.color.into()),
            };

            let mut bmi: BITMAPINFO = std::mem::zeroed();
            bmi.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;
            bmi.bmiHeader.biWidth = width as i32;
            bmi.bmiHeader.biHeight = -(height as i32); // top-down
            bmi.bmiHeader.biPlanes = 1;
            bmi.bmiHeader.biBitCount = 32;
            bmi.bmiHeader.biCompression = BI_RGB.0;

            let mut buffer = vec![0u8; width as usize * height as usize * 4];
            let lines = GetDIBits(
                dc.hdc,
                bitmaps.color,
                0,
                height,
                Some(buffer.as_mut_ptr().cast()),
                &mut bmi,
                DIB_RGB_COLORS,
            );
            drop(dc);
            drop(bitmaps);

            if lines == 0 {
                return Err(construction_error("GetDIBits"));
            }

            // BGRA -> RGBA
            for pixel in buffer.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
            // Icons without an alpha channel leave it zeroed
            if buffer.chunks_exact(4).all(|pixel| pixel[3] == 0) {
                for pixel in buffer.chunks_exact_mut(4) {
                    pixel[3] = 255;
                }
            }

            RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
                ExtractionError::IconConstruction(StringError::new(
                    "icon pixel buffer does not match its dimensions",
                ))
            })
        }
    }
}
