//! Panel layout engine core.
//!
//! Pure, synchronous building blocks for the modular panel workspace:
//! the panel data model, the view module registry, grid snapping, the
//! interactive resize controller, the layout store, the persisted-form
//! serializer and the role-keyed default layouts. Nothing in this crate
//! performs I/O; persistence lives in `x121-layout-engine`.

pub mod defaults;
pub mod error;
pub mod grid;
pub mod registry;
pub mod resize;
pub mod roles;
pub mod serializer;
pub mod store;
pub mod types;

pub use error::CoreError;
pub use registry::{ViewModuleRegistration, ViewModuleRegistry};
pub use store::LayoutStore;
pub use types::{LayoutMeta, PanelInstance, PanelPatch, Position, Size};
