//! Best-candidate selection over an icon group

use crate::icon::directory::IconDirEntry;

/// Pick the entry with the largest dimension
///
/// Scans in directory order and only replaces the current best on a strictly
/// greater dimension, so the earliest of equally large entries wins. An empty
/// directory has no candidate.
pub fn select_largest(entries: &[IconDirEntry]) -> Option<&IconDirEntry> {
    let mut best: Option<&IconDirEntry> = None;
    for entry in entries {
        if best.is_none_or(|current| entry.dimension() > current.dimension()) {
            best = Some(entry);
        }
    }
    best
}
