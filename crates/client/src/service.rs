//! The persistence contract the layout engine depends on.

use async_trait::async_trait;
use x121_layout_core::types::DbId;

use crate::error::LayoutApiError;
use crate::models::{
    AdminLayoutPreset, CreateAdminPreset, CreateUserLayout, LayoutRecord, UpdateAdminPreset,
    UpdateUserLayout,
};

/// CRUD access to the current user's saved layouts and to admin presets.
///
/// ```text
/// GET    /user/layouts              -> list_layouts
/// GET    /user/layouts/{id}         -> get_layout
/// POST   /user/layouts              -> create_layout
/// PUT    /user/layouts/{id}         -> update_layout
/// DELETE /user/layouts/{id}         -> delete_layout
/// GET    /admin/layout-presets      -> list_admin_presets
/// POST   /admin/layout-presets      -> create_admin_preset
/// PUT    /admin/layout-presets/{id} -> update_admin_preset
/// DELETE /admin/layout-presets/{id} -> delete_admin_preset
/// ```
#[async_trait]
pub trait LayoutService: Send + Sync {
    async fn list_layouts(&self) -> Result<Vec<LayoutRecord>, LayoutApiError>;

    async fn get_layout(&self, id: DbId) -> Result<LayoutRecord, LayoutApiError>;

    async fn create_layout(&self, input: &CreateUserLayout)
        -> Result<LayoutRecord, LayoutApiError>;

    async fn update_layout(
        &self,
        id: DbId,
        input: &UpdateUserLayout,
    ) -> Result<LayoutRecord, LayoutApiError>;

    async fn delete_layout(&self, id: DbId) -> Result<(), LayoutApiError>;

    async fn list_admin_presets(&self) -> Result<Vec<AdminLayoutPreset>, LayoutApiError>;

    async fn create_admin_preset(
        &self,
        input: &CreateAdminPreset,
    ) -> Result<AdminLayoutPreset, LayoutApiError>;

    async fn update_admin_preset(
        &self,
        id: DbId,
        input: &UpdateAdminPreset,
    ) -> Result<AdminLayoutPreset, LayoutApiError>;

    async fn delete_admin_preset(&self, id: DbId) -> Result<(), LayoutApiError>;
}
