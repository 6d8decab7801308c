//! Named layout switcher.
//!
//! Lists the user's saved layouts and lets them switch, save, delete and
//! flag layouts as default or shared. Switching and deleting go through the
//! [`PersistenceCoordinator`]; the list is a cached copy refreshed after
//! every change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use x121_layout_client::{CreateUserLayout, LayoutRecord, UpdateUserLayout};
use x121_layout_core::types::{DbId, LayoutMeta};

use crate::error::EngineError;
use crate::persistence::PersistenceCoordinator;
use crate::store::SaveApplied;

/// One row of the switcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSummary {
    pub id: DbId,
    pub name: String,
    pub is_default: bool,
    pub is_shared: bool,
}

impl From<&LayoutRecord> for LayoutSummary {
    fn from(record: &LayoutRecord) -> Self {
        Self {
            id: record.id,
            name: record.layout_name.clone(),
            is_default: record.is_default,
            is_shared: record.is_shared,
        }
    }
}

pub struct PresetSwitcher {
    coordinator: Arc<PersistenceCoordinator>,
    layouts: Mutex<Vec<LayoutSummary>>,
}

impl PresetSwitcher {
    pub fn new(coordinator: Arc<PersistenceCoordinator>) -> Self {
        Self {
            coordinator,
            layouts: Mutex::new(Vec::new()),
        }
    }

    /// Cached list from the last refresh.
    pub fn layouts(&self) -> Vec<LayoutSummary> {
        self.cache().clone()
    }

    /// Id of the layout currently in the store, if it has been saved.
    pub fn active_id(&self) -> Option<DbId> {
        self.coordinator.store().active_meta().id
    }

    /// Re-fetch the list from the service.
    pub async fn refresh(&self) -> Result<Vec<LayoutSummary>, EngineError> {
        let records = self.coordinator.list_layouts().await?;
        let layouts: Vec<LayoutSummary> = records.iter().map(LayoutSummary::from).collect();
        *self.cache() = layouts.clone();
        Ok(layouts)
    }

    /// Make layout `id` active.
    pub async fn switch_to(&self, id: DbId) -> Result<LayoutMeta, EngineError> {
        self.coordinator.load_layout(id).await
    }

    /// Save the current panels under `name`: updates the active layout when
    /// it is saved, otherwise creates a new one.
    pub async fn save_current(&self, name: &str) -> Result<LayoutMeta, EngineError> {
        let meta = self.coordinator.save_layout(Some(name)).await?;
        self.refresh_quietly().await;
        Ok(meta)
    }

    /// Save the current panels as a new layout named `name`, even when the
    /// active layout is already saved. The new layout becomes active.
    pub async fn save_as_new(&self, name: &str) -> Result<LayoutMeta, EngineError> {
        let store = self.coordinator.store();
        let snapshot = store.snapshot();
        let record = self
            .coordinator
            .service()
            .create_layout(&CreateUserLayout::from_panels(name, &snapshot.panels))
            .await?;

        match store.complete_save(&snapshot, record.id, &record.layout_name) {
            SaveApplied::Applied { .. } => {
                tracing::info!(layout_id = record.id, "Layout saved as new");
                self.refresh_quietly().await;
                Ok(LayoutMeta::saved(record.id, record.layout_name))
            }
            SaveApplied::Stale => Err(EngineError::Stale {
                layout_id: Some(record.id),
            }),
        }
    }

    /// Delete layout `id` and refresh the list. When it was the active
    /// layout the store keeps its panels and dirty flag but loses the saved
    /// identity.
    pub async fn delete(&self, id: DbId) -> Result<(), EngineError> {
        self.coordinator.delete_layout(id).await?;

        if self.coordinator.store().detach_identity(id) {
            tracing::info!(layout_id = id, "Active layout deleted; panels kept unsaved");
        }

        self.refresh().await?;
        Ok(())
    }

    /// Flag layout `id` as the one restored on startup.
    pub async fn set_default(&self, id: DbId) -> Result<(), EngineError> {
        self.update_flags(
            id,
            UpdateUserLayout {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn set_shared(&self, id: DbId, shared: bool) -> Result<(), EngineError> {
        self.update_flags(
            id,
            UpdateUserLayout {
                is_shared: Some(shared),
                ..Default::default()
            },
        )
        .await
    }

    async fn update_flags(&self, id: DbId, input: UpdateUserLayout) -> Result<(), EngineError> {
        self.coordinator.service().update_layout(id, &input).await?;
        self.refresh().await?;
        Ok(())
    }

    /// A failed list refresh after a successful write is not the caller's
    /// error; the stale cache is kept.
    async fn refresh_quietly(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Failed to refresh layout list");
        }
    }

    fn cache(&self) -> MutexGuard<'_, Vec<LayoutSummary>> {
        self.layouts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
