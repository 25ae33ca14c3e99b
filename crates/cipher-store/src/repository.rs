//! Project repository: the whole `ProjectCollection` lives under one store key.
//!
//! Every mutation is load → modify → write of the full collection. A failed
//! write leaves the stored collection as it was. Concurrent sessions sharing
//! one store resolve conflicts by last write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use cipher_core::{ProjectCollection, ProjectRecord, ValidationError, default_files};

use crate::error::{RepoError, StoreError};
use crate::keyed::{KeyedStore, KeyedStoreExt, SubscriptionId};

/// Store key holding the JSON object `{ projectId: ProjectRecord }`.
pub const PROJECTS_KEY: &str = "cipher_studio_projects";

pub struct ProjectRepository<S> {
    store: S,
}

impl<S: KeyedStore> ProjectRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the persisted collection. An absent key is an empty collection.
    pub fn load_collection(&self) -> Result<ProjectCollection, RepoError> {
        self.store
            .read_as::<ProjectCollection>(PROJECTS_KEY)
            .map(Option::unwrap_or_default)
            .map_err(RepoError::Load)
    }

    fn write_collection(&self, collection: &ProjectCollection) -> Result<(), StoreError> {
        self.store.write_as(PROJECTS_KEY, collection)
    }

    /// Snapshot of every project, most recently updated first. Ties keep
    /// creation order.
    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, RepoError> {
        Ok(self.load_collection()?.by_recency())
    }

    pub fn get_project(&self, id: &str) -> Result<ProjectRecord, RepoError> {
        self.load_collection()?
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    /// Create a project from the default template.
    pub fn create_project(&self, name: &str, now: DateTime<Utc>) -> Result<ProjectRecord, RepoError> {
        validate_name(name)?;
        let mut collection = self.load_collection()?;

        let record = ProjectRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            files: default_files(),
            updated_at: now,
        };
        collection.upsert(record.clone());
        self.write_collection(&collection)
            .map_err(RepoError::NotSaved)?;

        tracing::info!(project_id = %record.id, name = %record.name, "project created");
        Ok(record)
    }

    /// Remove a project. Deleting an unknown id is a no-op; returns whether
    /// anything was removed.
    pub fn delete_project(&self, id: &str) -> Result<bool, RepoError> {
        let mut collection = self.load_collection()?;
        if collection.remove(id).is_none() {
            return Ok(false);
        }
        self.write_collection(&collection)
            .map_err(RepoError::NotSaved)?;
        tracing::info!(project_id = %id, "project deleted");
        Ok(true)
    }

    /// Overwrite the stored record at `record.id`, stamping `updated_at`.
    ///
    /// The stamp never moves backwards relative to the stored or supplied
    /// record, even if `now` does. Not retried on failure.
    pub fn save_project(
        &self,
        record: &ProjectRecord,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, RepoError> {
        let mut collection = self.load_collection()?;

        let mut stamp = now.max(record.updated_at);
        if let Some(previous) = collection.get(&record.id) {
            stamp = stamp.max(previous.updated_at);
        }
        let saved = ProjectRecord {
            updated_at: stamp,
            ..record.clone()
        };

        collection.upsert(saved.clone());
        self.write_collection(&collection).map_err(|e| {
            tracing::warn!(project_id = %record.id, error = %e, "project save failed");
            RepoError::NotSaved(e)
        })?;

        tracing::debug!(project_id = %saved.id, updated_at = %saved.updated_at, "project saved");
        Ok(saved)
    }

    /// Change a project's display name.
    pub fn rename_project(
        &self,
        id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, RepoError> {
        validate_name(name)?;
        let mut record = self.get_project(id)?;
        record.name = name.to_string();
        self.save_project(&record, now)
    }

    /// Register a callback receiving the fresh project list (recency order)
    /// after every write of the collection.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&[ProjectRecord]) + Send + Sync + 'static,
    {
        self.store.subscribe(
            PROJECTS_KEY,
            Arc::new(move |_: &str, value: &serde_json::Value| {
                match serde_json::from_value::<ProjectCollection>(value.clone()) {
                    Ok(collection) => callback(&collection.by_recency()),
                    Err(e) => tracing::warn!(error = %e, "ignoring unreadable project collection"),
                }
            }),
        )
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}
