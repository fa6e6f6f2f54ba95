//! pam::store
//!
//! The dataset-level overlay store.
//!
//! One `PamStore` exists per overlay-capable dataset, shared between the
//! dataset and its bands via `Rc`. Band records keep only `Weak`
//! back-references: the store is never owned by a band, and a band must
//! tolerate the store being torn down independently.
//!
//! The store's job here is the dirty flag. Every band mutation propagates
//! up through [`PamStore::mark_dirty`]; an external save pass inspects
//! [`PamStore::is_dirty`], serializes each band, and calls
//! [`PamStore::clear_dirty`] once the sidecar document is written.

use std::cell::Cell;
use std::rc::Rc;

/// Dataset-level overlay state shared by all bands of a dataset.
#[derive(Debug, Default)]
pub struct PamStore {
    dirty: Cell<bool>,
}

impl PamStore {
    /// Create a clean store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clean store already wrapped for sharing.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Record that in-memory overlay state has diverged from its last
    /// persisted form.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Reset the dirty flag after a save pass.
    pub fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    /// Whether unsaved overlay changes exist.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }
}
