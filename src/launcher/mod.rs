//! Launcher collaborators of the icon core
//!
//! Folder scanning and editing, shortcut resolution and launching.

pub mod catalog;
pub mod launch;
pub mod shortcut;

pub use catalog::{
    APPS_FOLDER_NAME, AppEntry, add_to_apps_folder, is_supported_file, list_supported_files,
    remove_from_apps_folder, scan_apps_folder, tile_thumbnail,
};
pub use launch::{closes_after_launch, launch, launch_elevated, open_containing_folder};
#[cfg(windows)]
pub use shortcut::ShellLinkResolver;
pub use shortcut::{
    LnkResolver, PlatformResolver, ShortcutResolver, is_shortcut, read_link_file, read_link_target,
};
