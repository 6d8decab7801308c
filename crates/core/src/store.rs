//! Authoritative in-memory layout state.
//!
//! [`LayoutStore`] owns every [`PanelInstance`] of the active layout together
//! with the layout's identity and dirty flag. All changes go through the named
//! mutators below; callers never get mutable access to the collection.
//!
//! Two counters support the persistence layer:
//! - `revision` increases on every panel mutation, so a save can tell whether
//!   edits arrived while it was in flight.
//! - `generation` increases whenever the whole collection is replaced, so a
//!   late response from a previous layout session can be discarded.

use serde::Serialize;

use crate::types::{DbId, LayoutMeta, PanelInstance, PanelPatch, Size};

/// Point-in-time copy of the store, cheap enough to hand to a save call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutState {
    pub panels: Vec<PanelInstance>,
    pub active_meta: LayoutMeta,
    pub dirty: bool,
    pub revision: u64,
    pub generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutStore {
    panels: Vec<PanelInstance>,
    active_meta: LayoutMeta,
    dirty: bool,
    revision: u64,
    generation: u64,
}

impl LayoutStore {
    /// Empty, untitled, clean store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `panels` under the untitled identity.
    pub fn with_panels(panels: Vec<PanelInstance>, meta: Option<LayoutMeta>) -> Self {
        let mut store = Self::new();
        store.set_panels(panels, meta);
        store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn panels(&self) -> &[PanelInstance] {
        &self.panels
    }

    pub fn panel(&self, id: &str) -> Option<&PanelInstance> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn active_meta(&self) -> &LayoutMeta {
        &self.active_meta
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> LayoutState {
        LayoutState {
            panels: self.panels.clone(),
            active_meta: self.active_meta.clone(),
            dirty: self.dirty,
            revision: self.revision,
            generation: self.generation,
        }
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Replace the whole collection (layout switch). Clears `dirty`.
    ///
    /// `meta` defaults to the untitled identity.
    pub fn set_panels(&mut self, panels: Vec<PanelInstance>, meta: Option<LayoutMeta>) {
        self.panels = panels;
        self.active_meta = meta.unwrap_or_default();
        self.dirty = false;
        self.revision += 1;
        self.generation += 1;
    }

    /// Append a panel.
    ///
    /// Its size is clamped into range. A panel whose id is already present is
    /// refused and `false` is returned.
    pub fn add_panel(&mut self, mut panel: PanelInstance) -> bool {
        if self.panel(&panel.id).is_some() {
            tracing::warn!(panel_id = %panel.id, "Refusing to add panel with duplicate id");
            return false;
        }
        panel.size = panel.size.clamped();
        self.panels.push(panel);
        self.touch();
        true
    }

    /// Remove the panel with `id`. Unknown ids are a no-op.
    pub fn remove_panel(&mut self, id: &str) -> bool {
        let before = self.panels.len();
        self.panels.retain(|p| p.id != id);
        let removed = self.panels.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Merge `patch` into the panel with `id`. Unknown ids are a no-op.
    pub fn update_panel(&mut self, id: &str, patch: PanelPatch) -> bool {
        match self.panel_mut(id) {
            Some(panel) => {
                panel.apply(patch);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Flip `collapsed` on the panel with `id`. Unknown ids are a no-op.
    pub fn toggle_collapse(&mut self, id: &str) -> bool {
        match self.panel_mut(id) {
            Some(panel) => {
                panel.collapsed = !panel.collapsed;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Set a panel's size verbatim; callers clamp beforehand.
    pub fn resize_panel(&mut self, id: &str, size: Size) -> bool {
        match self.panel_mut(id) {
            Some(panel) => {
                panel.size = size;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Adopt a persisted identity after a successful save. Clears `dirty`.
    pub fn mark_saved(&mut self, id: DbId, name: impl Into<String>) {
        self.active_meta = LayoutMeta::saved(id, name);
        self.dirty = false;
    }

    /// Forget the persisted id when it is still `id`, keeping panels, name
    /// and `dirty`. Bumps `generation` so saves in flight come back stale.
    pub fn detach_identity(&mut self, id: DbId) -> bool {
        if self.active_meta.id != Some(id) {
            return false;
        }
        self.active_meta.id = None;
        self.generation += 1;
        true
    }

    /// Flag the store as needing a save without touching panels.
    pub fn mark_dirty(&mut self) {
        self.touch();
    }

    fn panel_mut(&mut self, id: &str) -> Option<&mut PanelInstance> {
        self.panels.iter_mut().find(|p| p.id == id)
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, MIN_WIDTH};

    fn panel(id: &str) -> PanelInstance {
        PanelInstance {
            id: id.to_string(),
            position: Position::new(0.0, 0.0),
            size: Size::new(400.0, 300.0),
            collapsed: false,
            view_module: "player".to_string(),
            view_props: None,
        }
    }

    fn seeded() -> LayoutStore {
        LayoutStore::with_panels(vec![panel("a"), panel("b")], None)
    }

    #[test]
    fn new_store_is_clean_and_untitled() {
        let store = LayoutStore::new();
        assert!(store.panels().is_empty());
        assert!(!store.is_dirty());
        assert_eq!(*store.active_meta(), LayoutMeta::untitled());
    }

    #[test]
    fn set_panels_resets_dirty_and_meta() {
        let mut store = seeded();
        store.add_panel(panel("c"));
        assert!(store.is_dirty());

        store.set_panels(vec![panel("x")], Some(LayoutMeta::saved(9, "Mine")));
        assert!(!store.is_dirty());
        assert_eq!(store.active_meta().id, Some(9));

        store.set_panels(vec![], None);
        assert_eq!(*store.active_meta(), LayoutMeta::untitled());
    }

    #[test]
    fn set_panels_bumps_generation() {
        let mut store = seeded();
        let g = store.generation();
        store.toggle_collapse("a");
        assert_eq!(store.generation(), g);
        store.set_panels(vec![], None);
        assert_eq!(store.generation(), g + 1);
    }

    #[test]
    fn add_panel_appends_and_marks_dirty() {
        let mut store = seeded();
        assert!(store.add_panel(panel("c")));
        assert_eq!(store.panels().last().unwrap().id, "c");
        assert!(store.is_dirty());
    }

    #[test]
    fn add_panel_refuses_duplicate_id() {
        let mut store = seeded();
        assert!(!store.add_panel(panel("a")));
        assert_eq!(store.panels().len(), 2);
        assert!(!store.is_dirty());
    }

    #[test]
    fn add_panel_clamps_size() {
        let mut store = LayoutStore::new();
        store.add_panel(panel("tiny").with_size(Size::new(1.0, 1.0)));
        assert_eq!(store.panel("tiny").unwrap().size.width, MIN_WIDTH);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut store = seeded();
        let before = store.panels().to_vec();
        assert!(!store.remove_panel("missing"));
        assert_eq!(store.panels(), before.as_slice());
        assert!(!store.is_dirty());
    }

    #[test]
    fn remove_panel_removes_matching_entry() {
        let mut store = seeded();
        assert!(store.remove_panel("a"));
        assert_eq!(store.panels().len(), 1);
        assert_eq!(store.panels()[0].id, "b");
        assert!(store.is_dirty());
    }

    #[test]
    fn toggle_collapse_twice_restores_panel() {
        let mut store = seeded();
        let original = store.panel("a").unwrap().clone();
        store.toggle_collapse("a");
        assert!(store.panel("a").unwrap().collapsed);
        store.toggle_collapse("a");
        assert_eq!(*store.panel("a").unwrap(), original);
    }

    #[test]
    fn update_panel_merges_fields() {
        let mut store = seeded();
        assert!(store.update_panel("b", PanelPatch::position(Position::new(60.0, 80.0))));
        let b = store.panel("b").unwrap();
        assert_eq!(b.position, Position::new(60.0, 80.0));
        assert_eq!(b.view_module, "player");
        assert!(!store.update_panel("missing", PanelPatch::collapsed(true)));
    }

    #[test]
    fn resize_panel_is_verbatim() {
        let mut store = seeded();
        store.resize_panel("a", Size::new(5.0, 5.0));
        assert_eq!(store.panel("a").unwrap().size, Size::new(5.0, 5.0));
    }

    #[test]
    fn mark_saved_adopts_identity_and_clears_dirty() {
        let mut store = seeded();
        store.toggle_collapse("a");
        store.mark_saved(42, "Editing");
        assert!(!store.is_dirty());
        assert_eq!(*store.active_meta(), LayoutMeta::saved(42, "Editing"));
    }

    #[test]
    fn detach_identity_keeps_panels_and_dirty() {
        let mut store = LayoutStore::with_panels(vec![panel("a")], Some(LayoutMeta::saved(7, "Ops")));
        store.toggle_collapse("a");
        let g = store.generation();
        let panels = store.panels().to_vec();

        assert!(!store.detach_identity(8));
        assert_eq!(store.active_meta().id, Some(7));

        assert!(store.detach_identity(7));
        assert_eq!(*store.active_meta(), LayoutMeta::unsaved("Ops"));
        assert_eq!(store.panels(), panels.as_slice());
        assert!(store.is_dirty());
        assert_eq!(store.generation(), g + 1);
    }

    #[test]
    fn mutations_apply_in_order() {
        let mut store = seeded();
        store.resize_panel("a", Size::new(500.0, 300.0));
        store.resize_panel("a", Size::new(600.0, 300.0));
        store.remove_panel("b");
        store.add_panel(panel("b"));
        let ids: Vec<_> = store.panels().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.panel("a").unwrap().size.width, 600.0);
    }

    #[test]
    fn revision_tracks_every_mutation() {
        let mut store = seeded();
        let r = store.revision();
        store.toggle_collapse("a");
        store.mark_dirty();
        assert_eq!(store.revision(), r + 2);
        store.mark_saved(1, "x");
        assert_eq!(store.revision(), r + 2);
    }
}
