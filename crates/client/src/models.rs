//! Wire models for saved layouts and admin layout presets.
//!
//! Mirrors the `user_layouts` and `admin_layout_presets` resources served
//! under `/user/layouts` and `/admin/layout-presets`.

use serde::{Deserialize, Serialize};
use x121_layout_core::serializer;
use x121_layout_core::types::{DbId, PanelInstance, Timestamp};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A saved user layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub id: DbId,
    #[serde(default)]
    pub user_id: Option<DbId>,
    pub layout_name: String,
    /// Serialized panel array, either as a JSON string or inline.
    pub layout_json: serde_json::Value,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// An admin-managed layout preset, optionally the default for a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLayoutPreset {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub role_default_for: Option<String>,
    pub layout_json: serde_json::Value,
    #[serde(default)]
    pub created_by: Option<DbId>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// Payload for creating a new user layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserLayout {
    pub layout_name: String,
    pub layout_json: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl CreateUserLayout {
    pub fn from_panels(layout_name: impl Into<String>, panels: &[PanelInstance]) -> Self {
        Self {
            layout_name: layout_name.into(),
            layout_json: layout_json_for(panels),
            is_default: Some(false),
        }
    }
}

/// Payload for partially updating a user layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_json: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_shared: Option<bool>,
}

impl UpdateUserLayout {
    /// Update carrying a fresh panel snapshot and, optionally, a new name.
    pub fn from_panels(layout_name: Option<String>, panels: &[PanelInstance]) -> Self {
        Self {
            layout_name,
            layout_json: Some(layout_json_for(panels)),
            ..Default::default()
        }
    }
}

/// Payload for creating an admin layout preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAdminPreset {
    pub name: String,
    #[serde(default)]
    pub role_default_for: Option<String>,
    pub layout_json: serde_json::Value,
}

/// Payload for partially updating an admin layout preset.
///
/// `role_default_for: Some(None)` serializes as `null` and clears the role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateAdminPreset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_default_for: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_json: Option<serde_json::Value>,
}

/// `layout_json` value for a panel collection: the serializer's text form.
pub fn layout_json_for(panels: &[PanelInstance]) -> serde_json::Value {
    serde_json::Value::String(serializer::serialize(panels))
}
