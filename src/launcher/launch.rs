//! Launching entries with the platform's default handler

use crate::error::{Result, TileIconError};
use std::path::Path;
use tracing::{error, info};

/// Open `path` the way a double click in the file manager would
pub fn launch(path: &Path) -> Result<()> {
    info!("Launching {:?}", path);
    open::that(path).map_err(|source| {
        error!("Failed to launch {:?}: {}", path, source);
        TileIconError::LaunchFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Start `path` through the shell's `runas` verb so it asks for elevation
///
/// Only Windows has such a verb; elsewhere this fails with
/// [`std::io::ErrorKind::Unsupported`].
pub fn launch_elevated(path: &Path) -> Result<()> {
    info!("Launching {:?} as administrator", path);
    elevated::run_as(path).map_err(|source| {
        error!("Failed to launch {:?} as administrator: {}", path, source);
        TileIconError::LaunchFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(windows)]
#[expect(unsafe_code, reason = "ShellExecuteExW reads only the borrowed strings in the info block")]
mod elevated {
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use windows::Win32::UI::Shell::{SEE_MASK_NOASYNC, SHELLEXECUTEINFOW, ShellExecuteExW};
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
    use windows::core::{PCWSTR, w};

    pub(super) fn run_as(path: &Path) -> std::io::Result<()> {
        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let mut info = SHELLEXECUTEINFOW {
            cbSize: std::mem::size_of::<SHELLEXECUTEINFOW>() as u32,
            fMask: SEE_MASK_NOASYNC,
            lpVerb: w!("runas"),
            lpFile: PCWSTR(wide_path.as_ptr()),
            nShow: SW_SHOWNORMAL.0,
            ..Default::default()
        };
        unsafe { ShellExecuteExW(&mut info) }.map_err(std::io::Error::other)
    }
}

#[cfg(not(windows))]
mod elevated {
    use std::path::Path;

    pub(super) fn run_as(_path: &Path) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "elevated launch needs the Windows shell",
        ))
    }
}

/// Show `path` in the file manager
///
/// On Windows the file is selected in an Explorer window; elsewhere the
/// containing directory is opened.
pub fn open_containing_folder(path: &Path) -> Result<()> {
    let failed = |source: std::io::Error| TileIconError::LaunchFailed {
        path: path.to_path_buf(),
        source,
    };

    #[cfg(windows)]
    {
        let mut select = std::ffi::OsString::from("/select,");
        select.push(path.as_os_str());
        std::process::Command::new("explorer.exe")
            .arg(select)
            .spawn()
            .map(drop)
            .map_err(failed)
    }

    #[cfg(not(windows))]
    {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| {
                failed(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "path has no containing folder",
                ))
            })?;
        open::that(parent).map_err(failed)
    }
}

/// Whether the launcher window should close after a successful launch
pub fn closes_after_launch(config: &crate::config::LauncherConfig) -> bool {
    !config.keep_launcher_open
}
