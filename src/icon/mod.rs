//! High-resolution icon extraction
//!
//! Pipeline, leaf to root:
//! - [`module`]: maps a file read-only and locates its icon group resource
//! - [`directory`]: parses the group's `GRPICONDIR`
//! - [`selector`]: picks the largest variant
//! - [`materialize`]: decodes the chosen `RT_ICON` payload
//! - [`extractor`]: runs the above and falls back to the associated icon,
//!   then to a placeholder

pub mod association;
pub mod directory;
pub mod extractor;
pub mod materialize;
pub mod module;
pub mod placeholder;
pub mod resources;
pub mod selector;
pub mod tracking;

pub use association::{AssociatedIconProvider, ShellAssociation};
pub use directory::{IconDirEntry, IconDirectory, parse_group_directory};
pub use extractor::{ExtractedIcon, IconExtractor, IconTier, extract_high_resolution, extract_icon};
pub use materialize::icon_from_resource_bits;
pub use module::MappedModule;
pub use placeholder::placeholder_icon;
pub use selector::select_largest;
