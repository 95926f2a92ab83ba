//! Configuration data models
//!
//! This module defines the data structures used for launcher configuration.
//! Field names are serialized in PascalCase so existing `config.json` files
//! keep loading.

use serde::{Deserialize, Serialize};

/// Top-level launcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LauncherConfig {
    /// Title shown in the launcher window
    pub window_title: String,
    /// File extensions (with leading dot) listed as tiles, in display order
    pub supported_extensions: Vec<String>,
    /// Whether the launcher stays open after starting an entry
    pub keep_launcher_open: bool,
    /// Icon extraction settings
    pub extraction: ExtractionSettings,
}

/// Icon extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ExtractionSettings {
    /// Ask the shell for the associated icon when no embedded icon can be read
    pub use_association_fallback: bool,
    /// Edge length of the square tile picture, in pixels
    pub tile_icon_size: u32,
    /// Extract icons on the rayon pool during folder scans
    pub parallel_scan: bool,
}

impl LauncherConfig {
    /// Whether `extension` (with or without a leading dot) is listed, ignoring case
    pub fn supports_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.');
        self.supported_extensions
            .iter()
            .any(|listed| listed.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            window_title: "应用中心".to_string(),
            supported_extensions: [".exe", ".lnk", ".bat", ".jar"]
                .into_iter()
                .map(String::from)
                .collect(),
            keep_launcher_open: false,
            extraction: ExtractionSettings::default(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            use_association_fallback: true,
            tile_icon_size: 55,
            parallel_scan: true,
        }
    }
}
