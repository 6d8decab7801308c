//! View module registry.
//!
//! Maps a string key to a content type that panels can host. Feature modules
//! register themselves at startup; the layout engine only ever looks keys up.
//! A registry is an ordinary value shared through `Arc`, so tests build
//! isolated instances instead of resetting global state.

use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::types::ViewProps;

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Error raised by a content renderer.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Everything a renderer is told about the panel it renders into.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub panel_id: &'a str,
    pub props: Option<&'a ViewProps>,
}

/// Content factory for one view module.
///
/// The returned JSON is an opaque view description handed to the host UI.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, ctx: RenderContext<'_>) -> Result<serde_json::Value, RenderError>;
}

impl<F> ViewRenderer for F
where
    F: Fn(RenderContext<'_>) -> Result<serde_json::Value, RenderError> + Send + Sync,
{
    fn render(&self, ctx: RenderContext<'_>) -> Result<serde_json::Value, RenderError> {
        self(ctx)
    }
}

type RendererLoader = Box<dyn Fn() -> Arc<dyn ViewRenderer> + Send + Sync>;

/// A renderer that is constructed the first time it is needed.
pub struct LazyRenderer {
    loader: RendererLoader,
    resolved: OnceLock<Arc<dyn ViewRenderer>>,
}

impl LazyRenderer {
    pub fn new(loader: impl Fn() -> Arc<dyn ViewRenderer> + Send + Sync + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            resolved: OnceLock::new(),
        }
    }

    /// Wrap an already-built renderer.
    pub fn ready(renderer: Arc<dyn ViewRenderer>) -> Self {
        let resolved = OnceLock::new();
        let _ = resolved.set(Arc::clone(&renderer));
        Self {
            loader: Box::new(move || Arc::clone(&renderer)),
            resolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolve (loading on first use) and return the renderer.
    pub fn get(&self) -> &Arc<dyn ViewRenderer> {
        self.resolved.get_or_init(|| (self.loader)())
    }
}

impl std::fmt::Debug for LazyRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRenderer")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// A content type panels may host.
#[derive(Debug, Clone)]
pub struct ViewModuleRegistration {
    pub key: String,
    pub label: String,
    pub renderer: Arc<LazyRenderer>,
    /// Advisory: `false` means UI should not offer a second instance.
    pub allow_multiple: bool,
}

impl ViewModuleRegistration {
    pub fn new(key: impl Into<String>, label: impl Into<String>, renderer: LazyRenderer) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            renderer: Arc::new(renderer),
            allow_multiple: true,
        }
    }

    pub fn singleton(mut self) -> Self {
        self.allow_multiple = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Key -> registration table, iterated in insertion order.
#[derive(Debug, Default)]
pub struct ViewModuleRegistry {
    modules: RwLock<IndexMap<String, ViewModuleRegistration>>,
}

impl ViewModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the registration for `registration.key`.
    ///
    /// Overwriting keeps the key's original position in [`list_all`](Self::list_all).
    pub fn register(&self, registration: ViewModuleRegistration) {
        let key = registration.key.clone();
        if self.write().insert(key.clone(), registration).is_some() {
            tracing::warn!(module = %key, "View module re-registered; previous registration replaced");
        } else {
            tracing::debug!(module = %key, "View module registered");
        }
    }

    pub fn lookup(&self, key: &str) -> Option<ViewModuleRegistration> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn list_all(&self) -> Vec<ViewModuleRegistration> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove every registration. Test isolation only.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, ViewModuleRegistration>> {
        self.modules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, ViewModuleRegistration>> {
        self.modules.write().unwrap_or_else(PoisonError::into_inner)
    }
}
