//! Configuration management module
//!
//! This module handles loading and saving the launcher configuration.
//! Configuration is stored in `config.json` beside the launcher executable
//! with atomic writes to prevent corruption.

pub mod manager;
pub mod models;

pub use manager::{CONFIG_FILE_NAME, ConfigManager};
pub use models::{ExtractionSettings, LauncherConfig};
