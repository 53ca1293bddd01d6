//! Shared store handle, configuration and call helpers for all components.

use std::future::Future;
use std::sync::Arc;

use competency_core::competency_set::CompetencySet;
use competency_core::error::CoreError;
use competency_core::reference::Position;
use competency_core::store::CompetencyStore;
use competency_core::types::DbId;

use crate::config::EngineConfig;

/// Store plus configuration, cloned into every component.
#[derive(Clone)]
pub struct EngineContext {
    store: Arc<dyn CompetencyStore>,
    config: EngineConfig,
}

impl EngineContext {
    pub fn new(store: Arc<dyn CompetencyStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn CompetencyStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one store call under the configured timeout.
    ///
    /// An elapsed timeout becomes the retryable [`CoreError::Timeout`]; the
    /// underlying future is dropped, so nothing further is sent for it.
    pub async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, "Backing store call timed out");
                Err(CoreError::Timeout {
                    operation,
                    secs: self.config.store_timeout.as_secs(),
                })
            }
        }
    }

    /// Load a set or fail with `NotFound`.
    pub async fn require_set(&self, set_id: DbId) -> Result<CompetencySet, CoreError> {
        self.call("find_set", self.store.find_set(set_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "CompetencySet",
                id: set_id,
            })
    }

    /// Load a set `viewer_id` may see. Private sets of other owners are
    /// reported as missing.
    pub async fn require_visible_set(
        &self,
        set_id: DbId,
        viewer_id: DbId,
    ) -> Result<CompetencySet, CoreError> {
        let set = self.require_set(set_id).await?;
        if !set.is_visible_to(viewer_id) {
            return Err(CoreError::NotFound {
                entity: "CompetencySet",
                id: set_id,
            });
        }
        Ok(set)
    }

    /// Load a position or fail with `NotFound`.
    pub async fn require_position(&self, position_id: DbId) -> Result<Position, CoreError> {
        self.call("find_position", self.store.find_position(position_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Position",
                id: position_id,
            })
    }

    /// Fail with `NotFound` for the first id in `ids` that is not a stored competency.
    pub async fn require_competencies(&self, ids: &[DbId]) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self
            .call("find_competencies", self.store.find_competencies(ids))
            .await?;
        let found_ids: Vec<DbId> = found.iter().map(|c| c.id).collect();
        match competency_core::competency_set::first_missing_id(ids, &found_ids) {
            Some(id) => Err(CoreError::NotFound {
                entity: "Competency",
                id,
            }),
            None => Ok(()),
        }
    }
}
