//! Competency-set reconciliation engine.
//!
//! Orchestrates the set catalog, position requirement view, merge engine,
//! assignment tracker, drift detector and sync executor over any
//! [`CompetencyStore`](competency_core::store::CompetencyStore).
//!
//! ```text
//! SetCatalog ──► MergeEngine ──► AssignmentTracker
//!                    ▲                 │
//!                    │                 ▼
//!               SyncExecutor ◄── DriftDetector
//! ```

pub mod catalog;
pub mod config;
pub mod context;
pub mod drift;
pub mod memory;
pub mod merge;
pub mod requirements;
pub mod sync;
pub mod tracker;

use std::sync::Arc;

use competency_core::store::CompetencyStore;

pub use catalog::{DeleteOutcome, SetCatalog};
pub use config::EngineConfig;
pub use context::EngineContext;
pub use drift::{DriftDetector, SetCoverage};
pub use memory::InMemoryStore;
pub use merge::MergeEngine;
pub use requirements::RequirementView;
pub use sync::SyncExecutor;
pub use tracker::AssignmentTracker;

/// Entry point bundling every component over one store.
///
/// Cheaply cloneable; component accessors hand out lightweight views that
/// share the same store and configuration.
#[derive(Clone)]
pub struct CompetencyEngine {
    ctx: EngineContext,
}

impl CompetencyEngine {
    pub fn new(store: Arc<dyn CompetencyStore>, config: EngineConfig) -> Self {
        Self {
            ctx: EngineContext::new(store, config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.ctx.config()
    }

    pub fn store(&self) -> &Arc<dyn CompetencyStore> {
        self.ctx.store()
    }

    pub fn catalog(&self) -> SetCatalog {
        SetCatalog::new(self.ctx.clone())
    }

    pub fn requirements(&self) -> RequirementView {
        RequirementView::new(self.ctx.clone())
    }

    pub fn merge(&self) -> MergeEngine {
        MergeEngine::new(self.ctx.clone())
    }

    pub fn tracker(&self) -> AssignmentTracker {
        AssignmentTracker::new(self.ctx.clone())
    }

    pub fn drift(&self) -> DriftDetector {
        DriftDetector::new(self.ctx.clone())
    }

    pub fn sync(&self) -> SyncExecutor {
        SyncExecutor::new(self.ctx.clone())
    }
}
