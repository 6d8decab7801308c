//! Panel container: projects the store into renderable panel views.
//!
//! Each panel is laid out at its stored position with its rendered size
//! (header height only when collapsed). Content comes from the view module
//! registry; a missing module renders an empty slot with a picker, and a
//! renderer that errors or panics only affects its own panel.
//!
//! Interactions (collapse, close, assign, resize) are written back through
//! the store's named mutators.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use x121_layout_core::error::CoreError;
use x121_layout_core::grid::snap_position;
use x121_layout_core::registry::{RenderContext, ViewModuleRegistration, ViewModuleRegistry};
use x121_layout_core::resize::{PointerCapture, ResizeController, ResizeDirection, ResizeLimits};
use x121_layout_core::types::{PanelInstance, PanelPatch, Position, Size};

use crate::store::SharedStore;

/// Header title of a panel with no module assigned.
pub const EMPTY_PANEL_TITLE: &str = "Empty panel";

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One entry of the empty-slot module picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleChoice {
    pub key: String,
    pub label: String,
    /// `false` for single-instance modules already placed in the layout.
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelBody {
    /// Header only; content is not rendered.
    Collapsed,
    Content {
        module: String,
        view: serde_json::Value,
    },
    /// No usable module. `missing_module` names a key that is not registered.
    EmptySlot {
        missing_module: Option<String>,
        choices: Vec<ModuleChoice>,
    },
    /// The module's renderer failed; the rest of the workspace is unaffected.
    Failed { module: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub id: String,
    pub title: String,
    pub position: Position,
    pub size: Size,
    pub collapsed: bool,
    pub body: PanelBody,
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

struct ActiveResize {
    panel_id: String,
    controller: ResizeController,
}

pub struct PanelContainer {
    store: Arc<SharedStore>,
    registry: Arc<ViewModuleRegistry>,
    limits: ResizeLimits,
    resize: Mutex<Option<ActiveResize>>,
}

impl PanelContainer {
    pub fn new(
        store: Arc<SharedStore>,
        registry: Arc<ViewModuleRegistry>,
        limits: ResizeLimits,
    ) -> Self {
        Self {
            store,
            registry,
            limits,
            resize: Mutex::new(None),
        }
    }

    /// Render every panel in store order.
    pub fn render(&self) -> Vec<PanelView> {
        let panels = self.store.panels();
        panels.iter().map(|p| self.render_panel(p, &panels)).collect()
    }

    fn render_panel(&self, panel: &PanelInstance, all: &[PanelInstance]) -> PanelView {
        let registration = self.registry.lookup(&panel.view_module);
        let title = match &registration {
            Some(reg) => reg.label.clone(),
            None if panel.is_empty_slot() => EMPTY_PANEL_TITLE.to_string(),
            None => panel.view_module.clone(),
        };

        let body = match registration {
            _ if panel.collapsed => PanelBody::Collapsed,
            Some(reg) => render_content(&reg, panel),
            None => PanelBody::EmptySlot {
                missing_module: (!panel.is_empty_slot()).then(|| panel.view_module.clone()),
                choices: self.module_choices(all),
            },
        };

        PanelView {
            id: panel.id.clone(),
            title,
            position: panel.position,
            size: panel.rendered_size(),
            collapsed: panel.collapsed,
            body,
        }
    }

    /// Registered modules in registration order, flagging single-instance
    /// modules that are already placed.
    pub fn module_choices(&self, panels: &[PanelInstance]) -> Vec<ModuleChoice> {
        self.registry
            .list_all()
            .into_iter()
            .map(|reg| ModuleChoice {
                available: reg.allow_multiple || !panels.iter().any(|p| p.view_module == reg.key),
                key: reg.key,
                label: reg.label,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Panel actions
    // -----------------------------------------------------------------------

    /// Put `module_key` into panel `panel_id` (empty-slot picker).
    pub fn assign_module(&self, panel_id: &str, module_key: &str) -> Result<(), CoreError> {
        self.ensure_placeable(module_key, Some(panel_id))?;
        if !self.store.update_panel(panel_id, PanelPatch::view_module(module_key)) {
            return Err(panel_not_found(panel_id));
        }
        tracing::debug!(panel_id, module = module_key, "Module assigned to panel");
        Ok(())
    }

    /// Add a new panel hosting `module_key` at the grid-snapped `position`.
    /// Returns the new panel's id.
    pub fn add_panel(&self, module_key: &str, position: Position) -> Result<String, CoreError> {
        self.ensure_placeable(module_key, None)?;
        let panel = PanelInstance::new(module_key).at(snap_position(position, self.limits.grid_size));
        let id = panel.id.clone();
        self.store.add_panel(panel);
        Ok(id)
    }

    /// Add an unassigned panel at the grid-snapped `position`.
    pub fn add_empty_slot(&self, position: Position) -> String {
        let panel = PanelInstance::empty_slot().at(snap_position(position, self.limits.grid_size));
        let id = panel.id.clone();
        self.store.add_panel(panel);
        id
    }

    pub fn toggle_collapse(&self, panel_id: &str) -> bool {
        self.store.toggle_collapse(panel_id)
    }

    /// Remove a panel, ending any resize gesture on it first.
    pub fn close(&self, panel_id: &str) -> bool {
        {
            let mut active = self.active_resize();
            if active.as_ref().is_some_and(|a| a.panel_id == panel_id) {
                if let Some(mut gesture) = active.take() {
                    gesture.controller.pointer_cancel();
                }
            }
        }
        self.store.remove_panel(panel_id)
    }

    fn ensure_placeable(&self, module_key: &str, target: Option<&str>) -> Result<(), CoreError> {
        let reg = self.registry.lookup(module_key).ok_or_else(|| CoreError::NotFound {
            entity: "ViewModule",
            id: module_key.to_string(),
        })?;
        if !reg.allow_multiple {
            let placed = self
                .store
                .read(|s| s.panels().iter().any(|p| p.view_module == module_key && Some(p.id.as_str()) != target));
            if placed {
                return Err(CoreError::Validation(format!(
                    "View module '{module_key}' allows a single instance and is already placed"
                )));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Resize gestures
    // -----------------------------------------------------------------------

    /// Start resizing `panel_id` from `pointer`. Sizes computed during the
    /// gesture are written to the store as they happen.
    pub fn begin_resize(
        &self,
        panel_id: &str,
        pointer: Position,
        direction: ResizeDirection,
        capture: Box<dyn PointerCapture>,
    ) -> Result<(), CoreError> {
        let start_size = self
            .store
            .panel(panel_id)
            .map(|p| p.size)
            .ok_or_else(|| panel_not_found(panel_id))?;

        let store = Arc::clone(&self.store);
        let id = panel_id.to_string();
        let mut controller = ResizeController::new(self.limits, move |size| {
            store.update_panel(&id, PanelPatch::size(size));
        });
        controller.begin_resize(pointer, direction, start_size, capture);

        // Replacing an active gesture drops it, which releases its capture.
        *self.active_resize() = Some(ActiveResize {
            panel_id: panel_id.to_string(),
            controller,
        });
        Ok(())
    }

    pub fn pointer_move(&self, pointer: Position) -> Option<Size> {
        self.active_resize()
            .as_mut()
            .and_then(|a| a.controller.pointer_move(pointer))
    }

    pub fn pointer_up(&self) -> Option<Size> {
        let mut gesture = self.active_resize().take()?;
        gesture.controller.pointer_up()
    }

    pub fn pointer_cancel(&self) -> Option<Size> {
        let mut gesture = self.active_resize().take()?;
        gesture.controller.pointer_cancel()
    }

    /// Id of the panel being resized, if any.
    pub fn resizing(&self) -> Option<String> {
        self.active_resize().as_ref().map(|a| a.panel_id.clone())
    }

    fn active_resize(&self) -> MutexGuard<'_, Option<ActiveResize>> {
        self.resize.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panel_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Panel",
        id: id.to_string(),
    }
}

/// Render one panel's content, containing errors and panics to the panel.
fn render_content(reg: &ViewModuleRegistration, panel: &PanelInstance) -> PanelBody {
    let ctx = RenderContext {
        panel_id: &panel.id,
        props: panel.view_props.as_ref(),
    };
    match catch_unwind(AssertUnwindSafe(|| reg.renderer.get().render(ctx))) {
        Ok(Ok(view)) => PanelBody::Content {
            module: reg.key.clone(),
            view,
        },
        Ok(Err(e)) => {
            tracing::warn!(panel_id = %panel.id, module = %reg.key, error = %e, "Panel content failed to render");
            PanelBody::Failed {
                module: reg.key.clone(),
                error: e.to_string(),
            }
        }
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            tracing::error!(panel_id = %panel.id, module = %reg.key, error = %error, "Panel content panicked");
            PanelBody::Failed {
                module: reg.key.clone(),
                error,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "renderer panicked".to_string()
    }
}
