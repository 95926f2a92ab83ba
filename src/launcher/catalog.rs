//! Apps folder scanning
//!
//! Lists the launchable files in the apps folder and extracts a tile icon
//! for each. Shortcuts are resolved first so the icon comes from the target.

use crate::config::LauncherConfig;
use crate::error::{Result, TileIconError};
use crate::icon::IconExtractor;
use crate::launcher::shortcut::ShortcutResolver;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the apps folder beside the launcher
pub const APPS_FOLDER_NAME: &str = "Apps";

/// One launchable file shown as a tile
#[derive(Debug, Clone)]
pub struct AppEntry {
    /// File in the apps folder (the shortcut itself for `.lnk` files)
    pub path: PathBuf,
    /// Tile caption: the file name without extension
    pub display_name: String,
    /// Path the icon was extracted from
    pub target_path: PathBuf,
    /// Icon at its native resolution
    pub icon: RgbaImage,
}

impl AppEntry {
    /// Build an entry, resolving the target and extracting its icon
    pub fn load(path: PathBuf, extractor: &IconExtractor, resolver: &dyn ShortcutResolver) -> Self {
        let target_path = resolver.resolve_shortcut_target(&path);
        let icon = extractor.extract(&target_path);
        let display_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            display_name,
            target_path,
            icon,
        }
    }

    /// Icon scaled for a `size`×`size` tile picture
    pub fn tile_picture(&self, size: u32) -> RgbaImage {
        tile_thumbnail(&self.icon, size)
    }
}

/// Scan `dir` for supported files and build their tile entries
///
/// Creates `dir` when it does not exist. Entries are ordered by the position
/// of their extension in `supported_extensions`, then by file name.
pub fn scan_apps_folder(
    dir: &Path,
    config: &LauncherConfig,
    extractor: &IconExtractor,
    resolver: &dyn ShortcutResolver,
) -> Result<Vec<AppEntry>> {
    let paths = list_supported_files(dir, config)?;
    info!("Found {} launchable files in {:?}", paths.len(), dir);

    let entries = if config.extraction.parallel_scan {
        paths
            .into_par_iter()
            .map(|path| AppEntry::load(path, extractor, resolver))
            .collect()
    } else {
        paths
            .into_iter()
            .map(|path| AppEntry::load(path, extractor, resolver))
            .collect()
    };
    Ok(entries)
}

/// Supported files in `dir`, in tile order
pub fn list_supported_files(dir: &Path, config: &LauncherConfig) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        debug!("Creating apps folder {:?}", dir);
        std::fs::create_dir_all(dir)?;
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut ordered: Vec<PathBuf> = Vec::with_capacity(files.len());
    for extension in &config.supported_extensions {
        let wanted = extension.trim_start_matches('.');
        for file in &files {
            let matches = file
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
            if matches && !ordered.contains(file) {
                ordered.push(file.clone());
            }
        }
    }
    Ok(ordered)
}

/// Whether `path` has one of the configured extensions
pub fn is_supported_file(path: &Path, config: &LauncherConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| config.supports_extension(ext))
}

/// Copy `source` into `apps_dir` under its own file name
///
/// Refuses files with an unsupported extension and never overwrites an
/// entry already in the folder. Returns the path of the new copy.
pub fn add_to_apps_folder(source: &Path, apps_dir: &Path, config: &LauncherConfig) -> Result<PathBuf> {
    if !is_supported_file(source, config) {
        debug!("Skipping unsupported file {:?}", source);
        return Err(TileIconError::UnsupportedFile {
            path: source.to_path_buf(),
        });
    }
    let name = source
        .file_name()
        .ok_or_else(|| TileIconError::UnsupportedFile {
            path: source.to_path_buf(),
        })?;

    let destination = apps_dir.join(name);
    if destination.exists() {
        warn!("{:?} is already in {:?}", name, apps_dir);
        return Err(TileIconError::AlreadyInApps {
            name: name.to_string_lossy().into_owned(),
        });
    }

    std::fs::create_dir_all(apps_dir)?;
    std::fs::copy(source, &destination)?;
    info!("Added {:?} to {:?}", name, apps_dir);
    Ok(destination)
}

/// Delete an entry from the apps folder
pub fn remove_from_apps_folder(path: &Path) -> Result<()> {
    std::fs::remove_file(path)?;
    info!("Removed {:?} from the apps folder", path);
    Ok(())
}

/// Fit `icon` into a transparent `size`×`size` square, keeping its aspect ratio
pub fn tile_thumbnail(icon: &RgbaImage, size: u32) -> RgbaImage {
    let size = size.max(1);
    let (width, height) = icon.dimensions();
    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    if width == 0 || height == 0 {
        return canvas;
    }

    let scale = f64::from(size) / f64::from(width.max(height));
    let fitted_width = scaled_edge(width, scale, size);
    let fitted_height = scaled_edge(height, scale, size);
    let resized = imageops::resize(icon, fitted_width, fitted_height, FilterType::Lanczos3);

    let x = i64::from((size - fitted_width) / 2);
    let y = i64::from((size - fitted_height) / 2);
    imageops::overlay(&mut canvas, &resized, x, y);
    canvas
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Result is clamped to 1..=size before the cast"
)]
fn scaled_edge(edge: u32, scale: f64, size: u32) -> u32 {
    (f64::from(edge) * scale).round().clamp(1.0, f64::from(size)) as u32
}
