//! Fallback chain controller
//!
//! Tier A reads the largest icon variant straight out of the file's resource
//! section. If any stage of that fails, Tier B asks the platform for the
//! file's associated icon, and Tier C hands back the built-in placeholder.
//! Nothing from the first two tiers ever reaches the caller except through
//! the log.

use crate::config::ExtractionSettings;
use crate::error::ExtractionError;
use crate::icon::association::{AssociatedIconProvider, ShellAssociation};
use crate::icon::directory::parse_group_directory;
use crate::icon::materialize::materialize;
use crate::icon::module::MappedModule;
use crate::icon::placeholder::placeholder_icon;
use crate::icon::selector::select_largest;
use image::RgbaImage;
use std::path::Path;
use tracing::{debug, warn};

/// Fallback tier that produced an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconTier {
    /// Largest variant read from the file's own resources
    HighResolution,
    /// Icon the platform associates with the file
    Association,
    /// Built-in generic application icon
    Placeholder,
}

/// An icon together with the tier it came from
#[derive(Debug, Clone)]
pub struct ExtractedIcon {
    /// Decoded RGBA bitmap at its native size
    pub image: RgbaImage,
    /// Which tier answered
    pub tier: IconTier,
}

/// Icon extractor with the three-tier fallback chain
///
/// Every call is independent and touches no shared mutable state, so one
/// extractor can be shared across threads during a bulk scan.
#[derive(Debug)]
pub struct IconExtractor {
    association: Option<Box<dyn AssociatedIconProvider>>,
}

impl Default for IconExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IconExtractor {
    /// Extractor using the platform shell for Tier B
    pub fn new() -> Self {
        Self {
            association: Some(Box::new(ShellAssociation)),
        }
    }

    /// Extractor configured from launcher settings
    pub fn from_settings(settings: &ExtractionSettings) -> Self {
        if settings.use_association_fallback {
            Self::new()
        } else {
            Self { association: None }
        }
    }

    /// Replace the Tier B provider
    #[must_use]
    pub fn with_association(mut self, provider: impl AssociatedIconProvider + 'static) -> Self {
        self.association = Some(Box::new(provider));
        self
    }

    /// Skip Tier B entirely
    #[must_use]
    pub fn without_association(mut self) -> Self {
        self.association = None;
        self
    }

    /// Best available icon for `path`; never fails
    pub fn extract(&self, path: &Path) -> RgbaImage {
        self.extract_with_tier(path).image
    }

    /// Best available icon for `path`, reporting which tier produced it
    pub fn extract_with_tier(&self, path: &Path) -> ExtractedIcon {
        match extract_high_resolution(path) {
            Ok(image) => {
                debug!(
                    "High-resolution icon {}x{} extracted from {:?}",
                    image.width(),
                    image.height(),
                    path
                );
                return ExtractedIcon {
                    image,
                    tier: IconTier::HighResolution,
                };
            }
            Err(e) => debug!("High-resolution extraction failed for {:?}: {}", path, e),
        }

        if let Some(provider) = &self.association {
            match provider.associated_icon(path) {
                Ok(image) => {
                    debug!("Using associated icon for {:?}", path);
                    return ExtractedIcon {
                        image,
                        tier: IconTier::Association,
                    };
                }
                Err(e) => warn!(
                    "Associated icon lookup failed for {:?}, using placeholder: {}",
                    path, e
                ),
            }
        }

        ExtractedIcon {
            image: placeholder_icon(),
            tier: IconTier::Placeholder,
        }
    }
}

/// Tier A alone: the largest icon variant embedded in `path`
///
/// The file mapping is released before this returns, whatever the outcome.
/// A group with no entries is reported as `IconGroupNotFound`.
pub fn extract_high_resolution(path: &Path) -> Result<RgbaImage, ExtractionError> {
    let module = MappedModule::open(path)?;
    let group = module.locate_icon_group()?;
    let entries = parse_group_directory(group)?;

    let best = select_largest(&entries).ok_or_else(|| ExtractionError::IconGroupNotFound {
        path: path.to_path_buf(),
    })?;
    debug!(
        "Selected icon #{} ({}px, {} bpp) out of {} variants in {:?}",
        best.id,
        best.dimension(),
        best.bit_count,
        entries.len(),
        path
    );

    materialize(&module, best.id)
}

/// Extract an icon with default settings
pub fn extract_icon(path: &Path) -> RgbaImage {
    IconExtractor::new().extract(path)
}
