//! Role default layouts.
//!
//! An admin can publish a layout preset as the default for a role. Those
//! presets take precedence over the built-in defaults; when none applies,
//! or the presets cannot be read, the built-in layout for the role is used.

use std::sync::Arc;

use x121_layout_client::{AdminLayoutPreset, LayoutService};
use x121_layout_core::defaults::get_default_layout_for_role;
use x121_layout_core::registry::ViewModuleRegistry;
use x121_layout_core::serializer;
use x121_layout_core::types::PanelInstance;

use crate::store::SharedStore;

pub struct RoleDefaults {
    service: Arc<dyn LayoutService>,
    registry: Arc<ViewModuleRegistry>,
}

impl RoleDefaults {
    pub fn new(service: Arc<dyn LayoutService>, registry: Arc<ViewModuleRegistry>) -> Self {
        Self { service, registry }
    }

    /// Default panels for `role`: the admin preset assigned to it when one
    /// exists and decodes to at least one usable panel, else the built-in
    /// layout.
    pub async fn resolve(&self, role: &str) -> Vec<PanelInstance> {
        match self.service.list_admin_presets().await {
            Ok(presets) => {
                if let Some(panels) = self.preset_panels(&presets, role) {
                    return panels;
                }
            }
            Err(e) if e.is_denied() => {
                tracing::debug!(role, "Admin presets not readable; using built-in default");
            }
            Err(e) => {
                tracing::warn!(role, error = %e, "Failed to fetch admin presets; using built-in default");
            }
        }
        get_default_layout_for_role(role)
    }

    /// Replace the store's panels with the resolved default for `role`,
    /// under the untitled identity.
    pub async fn seed(&self, store: &SharedStore, role: &str) {
        let panels = self.resolve(role).await;
        store.set_panels(panels, None);
    }

    fn preset_panels(&self, presets: &[AdminLayoutPreset], role: &str) -> Option<Vec<PanelInstance>> {
        let preset = presets
            .iter()
            .find(|p| p.role_default_for.as_deref() == Some(role))?;
        let panels = serializer::deserialize_value(&preset.layout_json, &*self.registry, false);
        if panels.is_empty() {
            tracing::warn!(
                role,
                preset_id = preset.id,
                "Admin preset has no usable panels; using built-in default",
            );
            return None;
        }
        tracing::debug!(role, preset_id = preset.id, "Using admin preset as role default");
        Some(panels)
    }
}
