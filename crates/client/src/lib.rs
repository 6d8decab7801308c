//! Client for the remote `user-layouts` persistence service.
//!
//! - [`LayoutService`]: the CRUD contract the layout engine persists
//!   through; implemented over HTTP by [`HttpLayoutService`] and by in-memory
//!   fakes in tests.
//! - [`models`]: wire shapes of saved layouts and admin layout presets.
//! - [`config`]: environment-driven client configuration.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod service;

pub use config::{ClientConfig, ConfigError};
pub use error::LayoutApiError;
pub use http::HttpLayoutService;
pub use models::{
    AdminLayoutPreset, CreateAdminPreset, CreateUserLayout, LayoutRecord, UpdateAdminPreset,
    UpdateUserLayout,
};
pub use service::LayoutService;
