//! Panel data model shared by every layer of the layout engine.

use serde::{Deserialize, Serialize};

/// Persistent layout identifiers are the backend's BIGSERIAL keys.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque value handed to a panel's content renderer. Usually an object,
/// but any JSON is kept as persisted.
pub type ViewProps = serde_json::Value;

// ---------------------------------------------------------------------------
// Size limits
// ---------------------------------------------------------------------------

/// Smallest width a panel may be rendered or persisted with.
pub const MIN_WIDTH: f64 = 200.0;

/// Largest width a panel may be rendered or persisted with.
pub const MAX_WIDTH: f64 = 1920.0;

/// Smallest height a panel may be rendered or persisted with.
pub const MIN_HEIGHT: f64 = 150.0;

/// Largest height a panel may be rendered or persisted with.
pub const MAX_HEIGHT: f64 = 1080.0;

/// Height of the header strip shown for a collapsed panel.
pub const COLLAPSED_HEADER_HEIGHT: f64 = 32.0;

/// Size given to panels created through [`PanelInstance::new`].
pub const DEFAULT_PANEL_SIZE: Size = Size {
    width: 400.0,
    height: 300.0,
};

/// Sentinel `view_module` value for an unassigned panel slot.
pub const EMPTY_VIEW_MODULE: &str = "";

/// Name given to a layout that has never been saved.
pub const UNTITLED_LAYOUT_NAME: &str = "Untitled";

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Top-left offset of a panel in pixels, relative to the workspace origin.
///
/// Unbounded: panels may sit partly or fully off-screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Panel dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp both axes into the allowed panel range.
    ///
    /// Non-finite components collapse to the axis minimum.
    pub fn clamped(self) -> Self {
        Self {
            width: clamp_axis(self.width, MIN_WIDTH, MAX_WIDTH),
            height: clamp_axis(self.height, MIN_HEIGHT, MAX_HEIGHT),
        }
    }

    /// Returns `true` if both axes are inside the allowed panel range.
    pub fn is_within_limits(&self) -> bool {
        (MIN_WIDTH..=MAX_WIDTH).contains(&self.width)
            && (MIN_HEIGHT..=MAX_HEIGHT).contains(&self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        DEFAULT_PANEL_SIZE
    }
}

pub(crate) fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

/// One visible region of the workspace.
///
/// Serialized with camelCase keys (`viewModule`, `viewProps`), which is the
/// shape stored in `layout_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelInstance {
    pub id: String,
    pub position: Position,
    pub size: Size,
    /// When set only the header is shown; `size.height` is kept for expand.
    pub collapsed: bool,
    /// Registry key of the hosted content, or [`EMPTY_VIEW_MODULE`].
    pub view_module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_props: Option<ViewProps>,
}

impl PanelInstance {
    /// Create an expanded panel at the origin with a fresh unique id.
    pub fn new(view_module: impl Into<String>) -> Self {
        Self {
            id: format!("panel-{}", uuid::Uuid::new_v4()),
            position: Position::ORIGIN,
            size: DEFAULT_PANEL_SIZE,
            collapsed: false,
            view_module: view_module.into(),
            view_props: None,
        }
    }

    /// Create an unassigned panel slot.
    pub fn empty_slot() -> Self {
        Self::new(EMPTY_VIEW_MODULE)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_props(mut self, props: ViewProps) -> Self {
        self.view_props = Some(props);
        self
    }

    /// Returns `true` if no view module is assigned to this panel.
    pub fn is_empty_slot(&self) -> bool {
        self.view_module.is_empty()
    }

    /// Size used for rendering: collapsed panels only show their header.
    pub fn rendered_size(&self) -> Size {
        if self.collapsed {
            Size::new(self.size.width, COLLAPSED_HEADER_HEIGHT)
        } else {
            self.size
        }
    }

    /// Merge the provided fields of `patch` into this panel.
    pub fn apply(&mut self, patch: PanelPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(collapsed) = patch.collapsed {
            self.collapsed = collapsed;
        }
        if let Some(view_module) = patch.view_module {
            self.view_module = view_module;
        }
        if let Some(view_props) = patch.view_props {
            self.view_props = view_props;
        }
    }
}

/// Partial update for [`PanelInstance`]; `None` leaves a field untouched.
///
/// `view_props` uses `Option<Option<_>>` so the bag can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelPatch {
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub collapsed: Option<bool>,
    pub view_module: Option<String>,
    pub view_props: Option<Option<ViewProps>>,
}

impl PanelPatch {
    pub fn size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn view_module(key: impl Into<String>) -> Self {
        Self {
            view_module: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn collapsed(collapsed: bool) -> Self {
        Self {
            collapsed: Some(collapsed),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Layout identity
// ---------------------------------------------------------------------------

/// Identity of the active named layout. `id` is `None` until first saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMeta {
    pub id: Option<DbId>,
    pub name: String,
}

impl LayoutMeta {
    pub fn untitled() -> Self {
        Self {
            id: None,
            name: UNTITLED_LAYOUT_NAME.to_string(),
        }
    }

    pub fn unsaved(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn saved(id: DbId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}

impl Default for LayoutMeta {
    fn default() -> Self {
        Self::untitled()
    }
}
