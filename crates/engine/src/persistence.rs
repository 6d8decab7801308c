//! Persistence coordinator: initial load, explicit save/load/delete, and
//! debounced autosave.
//!
//! The coordinator is the only component that talks to the remote
//! [`LayoutService`]. It reads the [`SharedStore`] and writes back through the
//! store's named mutators; a response that arrives after the layout was
//! switched is discarded instead of overwriting newer state.
//!
//! Autosave runs as a background task that waits on the store's change
//! notifications. Every change restarts the debounce timer, so a burst of
//! edits produces one save with the final state. Only layouts that already
//! have a server identity are autosaved; a failed autosave leaves the store
//! dirty and retries with exponential backoff.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use x121_layout_client::{CreateUserLayout, LayoutRecord, LayoutService, UpdateUserLayout};
use x121_layout_core::registry::ViewModuleRegistry;
use x121_layout_core::serializer;
use x121_layout_core::types::{DbId, LayoutMeta};

use crate::error::EngineError;
use crate::events::{EventBus, LayoutEvent, LayoutEventKind};
use crate::store::{SaveApplied, SharedStore};

/// How long [`PersistenceCoordinator::shutdown`] waits for the autosave task.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable parameters for autosave.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Quiet period after the last change before a save fires. Also the
    /// first retry delay after a failed autosave.
    pub debounce: Duration,
    /// Upper bound on the delay between retries.
    pub max_retry_delay: Duration,
    /// Factor by which the retry delay grows after each failure.
    pub retry_multiplier: f64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce: Duration::from_millis(2000),
            max_retry_delay: Duration::from_secs(30),
            retry_multiplier: 2.0,
        }
    }
}

/// Calculate the next retry delay, clamped to `max_retry_delay`.
pub fn next_retry_delay(current: Duration, config: &AutosaveConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.retry_multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_retry_delay)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStatus {
    Uninitialized,
    Loading,
    Ready,
    Saving,
}

/// What [`PersistenceCoordinator::mount`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum MountOutcome {
    /// A saved layout was restored into the store.
    Restored(LayoutMeta),
    /// The service holds no layouts for this user; the store is untouched.
    NoSavedLayout,
    /// The service could not be reached or refused; the store is untouched.
    Unavailable { message: String, retryable: bool },
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

struct Inner {
    store: Arc<SharedStore>,
    service: Arc<dyn LayoutService>,
    registry: Arc<ViewModuleRegistry>,
    config: AutosaveConfig,
    status: watch::Sender<PersistenceStatus>,
    events: EventBus,
    saves_in_flight: AtomicUsize,
    load_seq: AtomicU64,
}

pub struct PersistenceCoordinator {
    inner: Arc<Inner>,
    cancel: CancellationToken,
    autosave_task: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceCoordinator {
    pub fn new(
        store: Arc<SharedStore>,
        service: Arc<dyn LayoutService>,
        registry: Arc<ViewModuleRegistry>,
        config: AutosaveConfig,
    ) -> Self {
        let (status, _) = watch::channel(PersistenceStatus::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                store,
                service,
                registry,
                config,
                status,
                events: EventBus::default(),
                saves_in_flight: AtomicUsize::new(0),
                load_seq: AtomicU64::new(0),
            }),
            cancel: CancellationToken::new(),
            autosave_task: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<SharedStore> {
        &self.inner.store
    }

    pub fn service(&self) -> &Arc<dyn LayoutService> {
        &self.inner.service
    }

    pub fn registry(&self) -> &Arc<ViewModuleRegistry> {
        &self.inner.registry
    }

    pub fn status(&self) -> PersistenceStatus {
        *self.inner.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<PersistenceStatus> {
        self.inner.status.subscribe()
    }

    /// Subscribe to saved/failed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LayoutEvent> {
        self.inner.events.subscribe()
    }

    /// Restore the user's layout and start autosave.
    ///
    /// Picks the layout flagged `is_default`, else the first one listed. A
    /// failed or empty fetch leaves the store as it is.
    pub async fn mount(&self) -> MountOutcome {
        self.inner.status.send_replace(PersistenceStatus::Loading);
        let ticket = self.inner.next_load_ticket();

        let outcome = match self.inner.service.list_layouts().await {
            Ok(records) => {
                let chosen = records
                    .iter()
                    .find(|r| r.is_default)
                    .or_else(|| records.first());
                match chosen {
                    Some(record) if self.inner.is_latest_load(ticket) => {
                        MountOutcome::Restored(self.inner.apply_record(record))
                    }
                    Some(record) => {
                        tracing::debug!(layout_id = record.id, "Initial layout superseded by a newer load");
                        MountOutcome::NoSavedLayout
                    }
                    None => {
                        tracing::info!("No saved layouts; keeping current layout");
                        MountOutcome::NoSavedLayout
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch saved layouts; keeping current layout");
                self.inner.events.publish(LayoutEventKind::LoadFailed {
                    message: e.to_string(),
                });
                MountOutcome::Unavailable {
                    retryable: e.is_retryable(),
                    message: e.to_string(),
                }
            }
        };

        self.inner.status.send_replace(PersistenceStatus::Ready);
        self.start_autosave();
        outcome
    }

    /// Persist the current panels.
    ///
    /// Updates the active layout when it has a server identity, otherwise
    /// creates a new one named `name` (or the active name). `name` renames
    /// an existing layout.
    pub async fn save_layout(&self, name: Option<&str>) -> Result<LayoutMeta, EngineError> {
        self.inner.save(name).await
    }

    /// Fetch layout `id` and make it active. Only the most recent load wins.
    pub async fn load_layout(&self, id: DbId) -> Result<LayoutMeta, EngineError> {
        self.inner.load(id).await
    }

    /// Delete layout `id` remotely. The store is left alone even if `id` is
    /// the active layout.
    pub async fn delete_layout(&self, id: DbId) -> Result<(), EngineError> {
        self.inner.service.delete_layout(id).await?;
        tracing::info!(layout_id = id, "Layout deleted");
        self.inner
            .events
            .publish(LayoutEventKind::Deleted { layout_id: id });
        Ok(())
    }

    pub async fn list_layouts(&self) -> Result<Vec<LayoutRecord>, EngineError> {
        Ok(self.inner.service.list_layouts().await?)
    }

    /// Spawn the autosave task unless it is disabled or already running.
    pub fn start_autosave(&self) {
        if !self.inner.config.enabled {
            tracing::debug!("Autosave disabled");
            return;
        }
        let mut task = self
            .autosave_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if task.is_some() || self.cancel.is_cancelled() {
            return;
        }
        let changes = self.inner.store.subscribe();
        *task = Some(tokio::spawn(run_autosave(
            Arc::clone(&self.inner),
            changes,
            self.cancel.clone(),
        )));
    }

    /// Stop autosave and wait briefly for the task to finish. A pending
    /// debounce timer is dropped without saving.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self
            .autosave_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = task {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Autosave task did not stop in time");
            }
        }
    }
}

impl Drop for PersistenceCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl Inner {
    async fn save(&self, name: Option<&str>) -> Result<LayoutMeta, EngineError> {
        let snapshot = self.store.snapshot();
        let _saving = SavingGuard::begin(self);

        let result = match snapshot.active_meta.id {
            Some(id) => {
                let input = UpdateUserLayout::from_panels(name.map(str::to_string), &snapshot.panels);
                self.service.update_layout(id, &input).await.map(|r| (r, false))
            }
            None => {
                let layout_name = name.unwrap_or(&snapshot.active_meta.name);
                let input = CreateUserLayout::from_panels(layout_name, &snapshot.panels);
                self.service.create_layout(&input).await.map(|r| (r, true))
            }
        };

        let (record, created) = match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(
                    layout_id = ?snapshot.active_meta.id,
                    error = %e,
                    "Failed to save layout",
                );
                self.events.publish(LayoutEventKind::SaveFailed {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
                return Err(e.into());
            }
        };

        match self.store.complete_save(&snapshot, record.id, &record.layout_name) {
            SaveApplied::Applied { still_dirty } => {
                tracing::info!(
                    layout_id = record.id,
                    created,
                    still_dirty,
                    "Layout saved",
                );
                self.events.publish(LayoutEventKind::Saved {
                    layout_id: record.id,
                    layout_name: record.layout_name.clone(),
                    created,
                });
                Ok(LayoutMeta::saved(record.id, record.layout_name))
            }
            SaveApplied::Stale => {
                tracing::debug!(layout_id = record.id, "Save response for a replaced layout discarded");
                Err(EngineError::Stale {
                    layout_id: Some(record.id),
                })
            }
        }
    }

    async fn load(&self, id: DbId) -> Result<LayoutMeta, EngineError> {
        let ticket = self.next_load_ticket();
        let record = match self.service.get_layout(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(layout_id = id, error = %e, "Failed to load layout");
                self.events.publish(LayoutEventKind::LoadFailed {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        if !self.is_latest_load(ticket) {
            tracing::debug!(layout_id = id, "Load superseded by a newer request");
            return Err(EngineError::Stale { layout_id: Some(id) });
        }
        Ok(self.apply_record(&record))
    }

    fn apply_record(&self, record: &LayoutRecord) -> LayoutMeta {
        let panels = serializer::deserialize_value(&record.layout_json, &*self.registry, false);
        let meta = LayoutMeta::saved(record.id, record.layout_name.clone());
        self.store.set_panels(panels, Some(meta.clone()));
        tracing::info!(layout_id = record.id, layout_name = %record.layout_name, "Layout loaded");
        self.events.publish(LayoutEventKind::Loaded {
            layout_id: record.id,
            layout_name: record.layout_name.clone(),
        });
        meta
    }

    fn next_load_ticket(&self) -> u64 {
        self.load_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest_load(&self, ticket: u64) -> bool {
        self.load_seq.load(Ordering::SeqCst) == ticket
    }

    /// Autosave only touches layouts the server already knows.
    fn autosave_wanted(&self) -> bool {
        self.store
            .read(|s| s.is_dirty() && s.active_meta().id.is_some())
    }
}

/// Holds the `Saving` status while at least one save is in flight.
struct SavingGuard<'a>(&'a Inner);

impl<'a> SavingGuard<'a> {
    fn begin(inner: &'a Inner) -> Self {
        inner.saves_in_flight.fetch_add(1, Ordering::SeqCst);
        inner.status.send_if_modified(|s| {
            if *s == PersistenceStatus::Ready {
                *s = PersistenceStatus::Saving;
                true
            } else {
                false
            }
        });
        Self(inner)
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if self.0.saves_in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.status.send_if_modified(|s| {
                if *s == PersistenceStatus::Saving {
                    *s = PersistenceStatus::Ready;
                    true
                } else {
                    false
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Autosave loop
// ---------------------------------------------------------------------------

async fn run_autosave(
    inner: Arc<Inner>,
    mut changes: watch::Receiver<u64>,
    cancel: CancellationToken,
) {
    tracing::debug!(
        debounce_ms = inner.config.debounce.as_millis() as u64,
        "Autosave started",
    );
    let mut retry_delay: Option<Duration> = None;

    loop {
        if retry_delay.is_none() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if !inner.autosave_wanted() {
            retry_delay = None;
            continue;
        }

        // Debounce: every further change restarts the timer.
        let mut delay = retry_delay.unwrap_or(inner.config.debounce);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Autosave stopped with a pending save");
                    return;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    delay = inner.config.debounce;
                }
                _ = tokio::time::sleep(delay) => break,
            }
        }

        if !inner.autosave_wanted() {
            retry_delay = None;
            continue;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = inner.save(None) => result,
        };

        retry_delay = match result {
            Ok(_) => None,
            Err(e) if e.is_retryable() && inner.autosave_wanted() => {
                let next = next_retry_delay(delay, &inner.config);
                tracing::info!(
                    retry_in_ms = next.as_millis() as u64,
                    "Autosave failed; retrying",
                );
                Some(next)
            }
            Err(_) => None,
        };
    }

    tracing::debug!("Autosave stopped");
}
