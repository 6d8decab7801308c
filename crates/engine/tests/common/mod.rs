//! Shared fixtures for engine integration tests.
//!
//! [`FakeLayoutService`] is an in-memory `LayoutService` with call counters,
//! failure injection and hooks to hold or delay individual requests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;
use x121_layout_client::models::layout_json_for;
use x121_layout_client::{
    AdminLayoutPreset, CreateAdminPreset, CreateUserLayout, LayoutApiError, LayoutRecord,
    LayoutService, UpdateAdminPreset, UpdateUserLayout,
};
use x121_layout_core::defaults::modules;
use x121_layout_core::registry::{
    LazyRenderer, RenderContext, RenderError, ViewModuleRegistration, ViewModuleRegistry,
    ViewRenderer,
};
use x121_layout_core::serializer;
use x121_layout_core::types::{DbId, PanelInstance};
use x121_layout_engine::{AutosaveConfig, PersistenceCoordinator, SharedStore};

pub const DEBOUNCE: Duration = Duration::from_millis(2000);

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry with every built-in module, each rendering `{"module": key}`.
pub fn registry() -> Arc<ViewModuleRegistry> {
    let registry = ViewModuleRegistry::new();
    for key in modules::ALL {
        registry.register(ViewModuleRegistration::new(
            *key,
            key.replace('-', " "),
            echo_renderer(key),
        ));
    }
    Arc::new(registry)
}

pub fn echo_renderer(key: &str) -> LazyRenderer {
    let key = key.to_string();
    LazyRenderer::new(move || {
        let key = key.clone();
        let renderer: Arc<dyn ViewRenderer> = Arc::new(
            move |ctx: RenderContext<'_>| -> Result<serde_json::Value, RenderError> {
                Ok(json!({ "module": key, "panel": ctx.panel_id }))
            },
        );
        renderer
    })
}

// ---------------------------------------------------------------------------
// Fake service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeState {
    layouts: Vec<LayoutRecord>,
    presets: Vec<AdminLayoutPreset>,
    next_id: DbId,
}

#[derive(Default)]
pub struct FakeLayoutService {
    state: Mutex<FakeState>,
    pub lists: AtomicUsize,
    pub gets: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    failing_saves: AtomicUsize,
    offline: AtomicBool,
    presets_denied: AtomicBool,
    save_gate: Mutex<Option<Arc<Notify>>>,
    get_delays: Mutex<HashMap<DbId, Duration>>,
}

fn unavailable() -> LayoutApiError {
    LayoutApiError::Api {
        status: 503,
        body: "service unavailable".into(),
    }
}

fn not_found(id: DbId) -> LayoutApiError {
    LayoutApiError::Api {
        status: 404,
        body: format!("UserLayout with id {id} not found"),
    }
}

impl FakeLayoutService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_layout(&self, name: &str, panels: &[PanelInstance], is_default: bool) -> LayoutRecord {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let record = LayoutRecord {
            id: state.next_id,
            user_id: Some(1),
            layout_name: name.to_string(),
            layout_json: layout_json_for(panels),
            is_default,
            is_shared: false,
            created_at: None,
            updated_at: None,
        };
        state.layouts.push(record.clone());
        record
    }

    pub fn seed_preset(&self, name: &str, role: Option<&str>, panels: &[PanelInstance]) -> AdminLayoutPreset {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let preset = AdminLayoutPreset {
            id: state.next_id,
            name: name.to_string(),
            role_default_for: role.map(str::to_string),
            layout_json: layout_json_for(panels),
            created_by: Some(1),
            created_at: None,
            updated_at: None,
        };
        state.presets.push(preset.clone());
        preset
    }

    pub fn layout(&self, id: DbId) -> Option<LayoutRecord> {
        self.state
            .lock()
            .unwrap()
            .layouts
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn layout_count(&self) -> usize {
        self.state.lock().unwrap().layouts.len()
    }

    /// Panels as last persisted for `id`, decoded strictly.
    pub fn saved_panels(&self, id: DbId) -> Vec<PanelInstance> {
        let record = self.layout(id).expect("layout should exist");
        serializer::deserialize_value(&record.layout_json, modules::ALL, true)
    }

    pub fn saves(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }

    /// Fail the next `n` create/update calls with a 503.
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    /// Fail every call with a 503 while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Answer admin preset reads with 403.
    pub fn deny_presets(&self) {
        self.presets_denied.store(true, Ordering::SeqCst);
    }

    /// Make create/update wait until the returned gate is notified.
    pub fn hold_saves(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.save_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_saves(&self) {
        if let Some(gate) = self.save_gate.lock().unwrap().take() {
            gate.notify_waiters();
        }
    }

    /// Delay `get_layout(id)` responses by `delay`.
    pub fn delay_get(&self, id: DbId, delay: Duration) {
        self.get_delays.lock().unwrap().insert(id, delay);
    }

    fn check_online(&self) -> Result<(), LayoutApiError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }

    async fn before_save(&self) -> Result<(), LayoutApiError> {
        let gate = self.save_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_online()?;
        let failing = self.failing_saves.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_saves.store(failing - 1, Ordering::SeqCst);
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl LayoutService for FakeLayoutService {
    async fn list_layouts(&self) -> Result<Vec<LayoutRecord>, LayoutApiError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.state.lock().unwrap().layouts.clone())
    }

    async fn get_layout(&self, id: DbId) -> Result<LayoutRecord, LayoutApiError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let delay = self.get_delays.lock().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_online()?;
        self.layout(id).ok_or_else(|| not_found(id))
    }

    async fn create_layout(&self, input: &CreateUserLayout) -> Result<LayoutRecord, LayoutApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.before_save().await?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let record = LayoutRecord {
            id: state.next_id,
            user_id: Some(1),
            layout_name: input.layout_name.clone(),
            layout_json: input.layout_json.clone(),
            is_default: input.is_default.unwrap_or(false),
            is_shared: false,
            created_at: None,
            updated_at: None,
        };
        state.layouts.push(record.clone());
        Ok(record)
    }

    async fn update_layout(
        &self,
        id: DbId,
        input: &UpdateUserLayout,
    ) -> Result<LayoutRecord, LayoutApiError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.before_save().await?;
        let mut state = self.state.lock().unwrap();
        if input.is_default == Some(true) {
            for other in state.layouts.iter_mut() {
                other.is_default = false;
            }
        }
        let record = state
            .layouts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;
        if let Some(name) = &input.layout_name {
            record.layout_name = name.clone();
        }
        if let Some(layout_json) = &input.layout_json {
            record.layout_json = layout_json.clone();
        }
        if let Some(is_default) = input.is_default {
            record.is_default = is_default;
        }
        if let Some(is_shared) = input.is_shared {
            record.is_shared = is_shared;
        }
        Ok(record.clone())
    }

    async fn delete_layout(&self, id: DbId) -> Result<(), LayoutApiError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let before = state.layouts.len();
        state.layouts.retain(|r| r.id != id);
        if state.layouts.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn list_admin_presets(&self) -> Result<Vec<AdminLayoutPreset>, LayoutApiError> {
        self.check_online()?;
        if self.presets_denied.load(Ordering::SeqCst) {
            return Err(LayoutApiError::Api {
                status: 403,
                body: "Admin only".into(),
            });
        }
        Ok(self.state.lock().unwrap().presets.clone())
    }

    async fn create_admin_preset(
        &self,
        input: &CreateAdminPreset,
    ) -> Result<AdminLayoutPreset, LayoutApiError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let preset = AdminLayoutPreset {
            id: state.next_id,
            name: input.name.clone(),
            role_default_for: input.role_default_for.clone(),
            layout_json: input.layout_json.clone(),
            created_by: Some(1),
            created_at: None,
            updated_at: None,
        };
        state.presets.push(preset.clone());
        Ok(preset)
    }

    async fn update_admin_preset(
        &self,
        id: DbId,
        input: &UpdateAdminPreset,
    ) -> Result<AdminLayoutPreset, LayoutApiError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let preset = state
            .presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        if let Some(name) = &input.name {
            preset.name = name.clone();
        }
        if let Some(role) = &input.role_default_for {
            preset.role_default_for = role.clone();
        }
        if let Some(layout_json) = &input.layout_json {
            preset.layout_json = layout_json.clone();
        }
        Ok(preset.clone())
    }

    async fn delete_admin_preset(&self, id: DbId) -> Result<(), LayoutApiError> {
        self.check_online()?;
        self.state.lock().unwrap().presets.retain(|p| p.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub service: Arc<FakeLayoutService>,
    pub store: Arc<SharedStore>,
    pub registry: Arc<ViewModuleRegistry>,
    pub coordinator: Arc<PersistenceCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AutosaveConfig {
            debounce: DEBOUNCE,
            ..Default::default()
        })
    }

    pub fn with_config(config: AutosaveConfig) -> Self {
        let service = FakeLayoutService::new();
        let store = Arc::new(SharedStore::default());
        let registry = registry();
        let coordinator = Arc::new(PersistenceCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&service) as Arc<dyn LayoutService>,
            Arc::clone(&registry),
            config,
        ));
        Self {
            service,
            store,
            registry,
            coordinator,
        }
    }
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
