//! Panel layout engine runtime.
//!
//! Connects the pure layout core to the remote persistence service:
//!
//! - [`SharedStore`]: the layout store behind a mutex, with change
//!   notification for observers such as autosave.
//! - [`PersistenceCoordinator`]: initial load, explicit save/load/delete
//!   and debounced autosave.
//! - [`PanelContainer`]: projects the store into renderable panel views
//!   and wires collapse, close, assign and resize interactions back in.
//! - [`PresetSwitcher`]: lists, switches, saves and deletes named layouts.
//! - [`RoleDefaults`]: role default layouts, preferring admin presets.
//! - [`EventBus`]: transient persistence notifications for the UI.

pub mod config;
pub mod container;
pub mod error;
pub mod events;
pub mod persistence;
pub mod presets;
pub mod role_defaults;
pub mod store;

pub use config::EngineConfig;
pub use container::{ModuleChoice, PanelBody, PanelContainer, PanelView};
pub use error::EngineError;
pub use events::{EventBus, LayoutEvent, LayoutEventKind};
pub use persistence::{AutosaveConfig, MountOutcome, PersistenceCoordinator, PersistenceStatus};
pub use presets::{LayoutSummary, PresetSwitcher};
pub use role_defaults::RoleDefaults;
pub use store::SharedStore;
