//! Error types for the tile launcher core
//!
//! This module defines all error types used throughout the crate, providing
//! clear error messages and proper error propagation.
//!
//! Icon extraction has its own taxonomy (`ExtractionError`). Those errors are
//! absorbed by the fallback chain in [`crate::icon::IconExtractor`] and only
//! reach callers that ask for a single tier explicitly.

use std::path::PathBuf;
use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Failures of the icon extraction pipeline
///
/// One variant per stage of the high-resolution path, plus the association
/// tier. None of these ever escapes [`crate::icon::IconExtractor::extract`].
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file could not be opened, mapped, or recognised as a PE image
    #[error("Cannot open {path} as a resource module: {source}")]
    ResourceAccess {
        /// File that was being opened
        path: PathBuf,
        /// Underlying I/O or PE format error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No icon group by the conventional id nor by enumeration
    #[error("No icon group resource in {path}")]
    IconGroupNotFound {
        /// File that was searched
        path: PathBuf,
    },

    /// The icon group directory is shorter than its declared entry count requires
    #[error(
        "Malformed icon group directory: {declared} entries need {required} bytes, resource has {available}"
    )]
    MalformedDirectory {
        /// Entry count read from the directory header
        declared: u16,
        /// Bytes needed for the header plus the declared entries
        required: usize,
        /// Bytes actually present in the resource
        available: usize,
    },

    /// The selected entry's `RT_ICON` resource is missing
    #[error("Icon resource #{id} not found")]
    IconResourceNotFound {
        /// Resource id taken from the icon directory entry
        id: u16,
    },

    /// The raw icon bitstream could not be turned into an image
    /// Preserves the underlying error source for full error chain transparency
    #[error("Failed to construct icon: {0}")]
    IconConstruction(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operating system had no associated icon for the file
    #[error("No associated icon for {path}: {reason}")]
    AssociationUnavailable {
        /// File that was queried
        path: PathBuf,
        /// Why the lookup failed
        reason: String,
    },
}

impl ExtractionError {
    pub(crate) fn resource_access(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ResourceAccess {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Main error type for the launcher core
#[derive(Debug, Error)]
pub enum TileIconError {
    /// Icon extraction failed (only surfaced by single-tier entry points)
    #[error("Icon extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Shortcut could not be resolved
    #[error("Failed to resolve shortcut {path}: {reason}")]
    ShortcutError {
        /// Shortcut file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Launching an entry failed
    #[error("Failed to launch {path}: {source}")]
    LaunchFailed {
        /// Entry that was launched
        path: PathBuf,
        /// Error reported by the default handler
        #[source]
        source: std::io::Error,
    },

    /// A file dropped on the launcher has an extension it does not list
    #[error("Unsupported file type: {path}")]
    UnsupportedFile {
        /// Rejected file
        path: PathBuf,
    },

    /// The apps folder already holds a file with this name
    #[error("{name} is already in the apps folder")]
    AlreadyInApps {
        /// File name that clashed
        name: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, TileIconError>;

/// Convert an error to a user-friendly message
///
/// Returns a message suitable for a launcher error dialog.
pub fn get_user_friendly_error(error: &TileIconError) -> String {
    match error {
        TileIconError::Extraction(_) => "The icon for this entry could not be read.\n\n\
             A generic icon is shown instead.\n\
             This does not affect launching."
            .to_string(),
        TileIconError::ConfigError(_) | TileIconError::JsonError(_) => {
            "Failed to load or save configuration.\n\n\
             Your settings may not persist.\n\
             Check that config.json next to the launcher is writable."
                .to_string()
        }
        TileIconError::ShortcutError { path, .. } => {
            format!(
                "Could not read shortcut: {}\n\n\
                 The shortcut itself will be launched instead of its target.",
                path.display()
            )
        }
        TileIconError::LaunchFailed { path, source } => {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            format!("Unable to launch: {name}\n\nError: {source}")
        }
        TileIconError::UnsupportedFile { path } => {
            format!(
                "{} cannot be added.\n\n\
                 Only programs, shortcuts and scripts can be added to the launcher.",
                path.display()
            )
        }
        TileIconError::AlreadyInApps { name } => {
            format!("{name} is already in the launcher.\n\nRename the file to add another copy.")
        }
        TileIconError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        TileIconError::ImageError(e) => {
            format!("An image could not be processed:\n\n{e}")
        }
    }
}
