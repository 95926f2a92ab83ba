//! Live handle accounting
//!
//! Every mapped module and every native icon handle acquired by the
//! extraction pipeline registers itself here for as long as it is alive.
//! The counters never drive behaviour; they exist so leaks across thousands
//! of tiles show up in tests and diagnostics.

use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_MODULES: AtomicUsize = AtomicUsize::new(0);
static LIVE_ICONS: AtomicUsize = AtomicUsize::new(0);

/// Kind of resource a [`HandleToken`] stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// A binary mapped read-only as a resource container
    Module,
    /// A native icon object (`HICON` on Windows)
    Icon,
}

impl HandleKind {
    fn counter(self) -> &'static AtomicUsize {
        match self {
            Self::Module => &LIVE_MODULES,
            Self::Icon => &LIVE_ICONS,
        }
    }
}

/// Registration held by an owning guard; deregisters on drop
#[derive(Debug)]
pub(crate) struct HandleToken {
    kind: HandleKind,
}

impl HandleToken {
    pub(crate) fn acquire(kind: HandleKind) -> Self {
        kind.counter().fetch_add(1, Ordering::SeqCst);
        Self { kind }
    }
}

impl Drop for HandleToken {
    fn drop(&mut self) {
        self.kind.counter().fetch_sub(1, Ordering::SeqCst);
    }
}

/// Number of handles of `kind` currently alive in this process
pub fn live_handles(kind: HandleKind) -> usize {
    kind.counter().load(Ordering::SeqCst)
}

/// Total number of live module and icon handles
pub fn total_live_handles() -> usize {
    live_handles(HandleKind::Module) + live_handles(HandleKind::Icon)
}
