//! Thread-safe handle to the layout store.
//!
//! [`SharedStore`] wraps a [`LayoutStore`] in a mutex and bumps a
//! `tokio::sync::watch` counter after every mutation, so observers such as
//! the autosave task wake on change instead of polling.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use x121_layout_core::defaults::get_default_layout_for_role;
use x121_layout_core::store::{LayoutState, LayoutStore};
use x121_layout_core::types::{DbId, LayoutMeta, PanelInstance, PanelPatch, Size};

/// Result of applying a finished save to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveApplied {
    /// Identity adopted. `still_dirty` when edits landed while the save ran.
    Applied { still_dirty: bool },
    /// The collection was replaced since the snapshot; nothing changed.
    Stale,
}

pub struct SharedStore {
    inner: Mutex<LayoutStore>,
    changes: watch::Sender<u64>,
}

impl SharedStore {
    pub fn new(store: LayoutStore) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Mutex::new(store),
            changes,
        }
    }

    /// Store holding the static default layout for `role`, untitled and clean.
    pub fn seeded_for_role(role: &str) -> Self {
        Self::new(LayoutStore::with_panels(get_default_layout_for_role(role), None))
    }

    /// Receiver that observes a new value after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Run `f` against the store under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&LayoutStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> LayoutState {
        self.lock().snapshot()
    }

    pub fn panels(&self) -> Vec<PanelInstance> {
        self.lock().panels().to_vec()
    }

    pub fn panel(&self, id: &str) -> Option<PanelInstance> {
        self.lock().panel(id).cloned()
    }

    pub fn active_meta(&self) -> LayoutMeta {
        self.lock().active_meta().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation()
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    pub fn set_panels(&self, panels: Vec<PanelInstance>, meta: Option<LayoutMeta>) {
        self.mutate(|s| {
            s.set_panels(panels, meta);
            true
        });
    }

    pub fn add_panel(&self, panel: PanelInstance) -> bool {
        self.mutate(|s| s.add_panel(panel))
    }

    pub fn remove_panel(&self, id: &str) -> bool {
        self.mutate(|s| s.remove_panel(id))
    }

    pub fn update_panel(&self, id: &str, patch: PanelPatch) -> bool {
        self.mutate(|s| s.update_panel(id, patch))
    }

    pub fn toggle_collapse(&self, id: &str) -> bool {
        self.mutate(|s| s.toggle_collapse(id))
    }

    pub fn resize_panel(&self, id: &str, size: Size) -> bool {
        self.mutate(|s| s.resize_panel(id, size))
    }

    pub fn mark_saved(&self, id: DbId, name: &str) {
        self.mutate(|s| {
            s.mark_saved(id, name);
            true
        });
    }

    pub fn mark_dirty(&self) {
        self.mutate(|s| {
            s.mark_dirty();
            true
        });
    }

    /// Drop the saved id of a deleted layout if it is still active.
    pub fn detach_identity(&self, id: DbId) -> bool {
        self.mutate(|s| s.detach_identity(id))
    }

    /// Adopt the identity returned by a save that started from `snapshot`.
    ///
    /// Checked and applied under one lock: a replaced collection makes the
    /// response stale, and edits made during the save keep the store dirty.
    pub fn complete_save(&self, snapshot: &LayoutState, id: DbId, name: &str) -> SaveApplied {
        let mut outcome = SaveApplied::Stale;
        self.mutate(|s| {
            if s.generation() != snapshot.generation {
                return false;
            }
            let edited_meanwhile = s.revision() != snapshot.revision;
            s.mark_saved(id, name);
            if edited_meanwhile {
                s.mark_dirty();
            }
            outcome = SaveApplied::Applied {
                still_dirty: edited_meanwhile,
            };
            true
        });
        outcome
    }

    fn mutate(&self, f: impl FnOnce(&mut LayoutStore) -> bool) -> bool {
        let changed = f(&mut self.lock());
        if changed {
            self.changes.send_modify(|n| *n = n.wrapping_add(1));
        }
        changed
    }

    fn lock(&self) -> MutexGuard<'_, LayoutStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new(LayoutStore::new())
    }
}
