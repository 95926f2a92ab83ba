//! `tile-icons` - icon extraction and apps-folder scanning for a tile launcher
//!
//! Reads the largest icon variant embedded in an executable's resource
//! section, falling back to the platform's associated icon and finally to a
//! generic placeholder, so every tile always gets a picture.
//!
//! ```no_run
//! use std::path::Path;
//! use tile_icons::icon::IconExtractor;
//!
//! let icon = IconExtractor::new().extract(Path::new(r"C:\Games\game.exe"));
//! println!("{}x{}", icon.width(), icon.height());
//! ```
//!
//! The `launcher` module adds the surrounding pieces a launcher needs:
//! listing and editing the apps folder, resolving `.lnk` shortcuts,
//! thumbnailing icons to tile size and opening entries.

// Module declarations
pub mod config;
pub mod error;
pub mod icon;
pub mod launcher;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigManager, ExtractionSettings, LauncherConfig};
pub use error::{ExtractionError, Result, TileIconError};
pub use icon::{IconExtractor, IconTier, extract_icon};
