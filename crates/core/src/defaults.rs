//! Built-in role default layouts.
//!
//! Used when a user has no saved layout. Every role string resolves to a
//! non-empty layout: unknown roles get the [`FALLBACK_ROLE`] layout.

use crate::roles::{FALLBACK_ROLE, ROLE_ADMIN, ROLE_CREATOR, ROLE_REVIEWER};
use crate::types::{PanelInstance, Position, Size};

/// Keys of the view modules referenced by the built-in layouts.
pub mod modules {
    pub const LIBRARY_BROWSER: &str = "library-browser";
    pub const VIDEO_PLAYER: &str = "video-player";
    pub const METADATA_INSPECTOR: &str = "metadata-inspector";
    pub const REVIEW_NOTES: &str = "review-notes";
    pub const JOB_QUEUE: &str = "job-queue";
    pub const WORKER_MONITOR: &str = "worker-monitor";
    pub const ACTIVITY_FEED: &str = "activity-feed";

    pub const ALL: &[&str] = &[
        LIBRARY_BROWSER,
        VIDEO_PLAYER,
        METADATA_INSPECTOR,
        REVIEW_NOTES,
        JOB_QUEUE,
        WORKER_MONITOR,
        ACTIVITY_FEED,
    ];
}

/// Name given to a layout seeded from role defaults.
pub const DEFAULT_LAYOUT_NAME: &str = "Default";

/// Default layout for `role`, or the fallback role's layout.
pub fn get_default_layout_for_role(role: &str) -> Vec<PanelInstance> {
    layout_for(role).unwrap_or_else(|| {
        tracing::debug!(role, fallback = FALLBACK_ROLE, "No default layout for role");
        fallback_layout()
    })
}

/// Returns `true` if `role` has its own built-in layout.
pub fn has_default_layout(role: &str) -> bool {
    layout_for(role).is_some()
}

fn fallback_layout() -> Vec<PanelInstance> {
    layout_for(FALLBACK_ROLE).unwrap_or_else(creator_layout)
}

fn layout_for(role: &str) -> Option<Vec<PanelInstance>> {
    match role {
        ROLE_ADMIN => Some(admin_layout()),
        ROLE_CREATOR => Some(creator_layout()),
        ROLE_REVIEWER => Some(reviewer_layout()),
        _ => None,
    }
}

fn fixed(id: &str, module: &str, x: f64, y: f64, width: f64, height: f64) -> PanelInstance {
    PanelInstance {
        id: id.to_string(),
        position: Position::new(x, y),
        size: Size::new(width, height),
        collapsed: false,
        view_module: module.to_string(),
        view_props: None,
    }
}

fn admin_layout() -> Vec<PanelInstance> {
    vec![
        fixed("default-admin-workers", modules::WORKER_MONITOR, 0.0, 0.0, 640.0, 400.0),
        fixed("default-admin-jobs", modules::JOB_QUEUE, 660.0, 0.0, 640.0, 400.0),
        fixed("default-admin-activity", modules::ACTIVITY_FEED, 0.0, 420.0, 1300.0, 300.0),
    ]
}

fn creator_layout() -> Vec<PanelInstance> {
    vec![
        fixed("default-creator-library", modules::LIBRARY_BROWSER, 0.0, 0.0, 360.0, 720.0),
        fixed("default-creator-player", modules::VIDEO_PLAYER, 380.0, 0.0, 900.0, 520.0),
        fixed("default-creator-inspector", modules::METADATA_INSPECTOR, 1300.0, 0.0, 400.0, 720.0),
    ]
}

fn reviewer_layout() -> Vec<PanelInstance> {
    vec![
        fixed("default-reviewer-player", modules::VIDEO_PLAYER, 0.0, 0.0, 1000.0, 600.0),
        fixed("default-reviewer-notes", modules::REVIEW_NOTES, 1020.0, 0.0, 460.0, 600.0),
        fixed("default-reviewer-library", modules::LIBRARY_BROWSER, 0.0, 620.0, 1000.0, 240.0),
    ]
}
