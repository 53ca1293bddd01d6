use serde::Serialize;

use crate::types::{DbId, Level};

/// A single target (competency or assignment) that could not be applied.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedTarget {
    pub id: DbId,
    pub reason: String,
}

/// Outcome of a multi-item operation where some per-item calls failed.
///
/// Nothing is rolled back: `succeeded` entries are already persisted, so a
/// caller only needs to retry the ids listed in `failed` and `not_processed`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PartialApplyReport {
    /// What the ids refer to: `"competency"` for an apply, `"assignment"` for a sync.
    pub target: &'static str,
    pub succeeded: Vec<DbId>,
    pub failed: Vec<FailedTarget>,
    /// Ids skipped because the operation was cancelled before reaching them.
    pub not_processed: Vec<DbId>,
}

impl PartialApplyReport {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// `true` when every target succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.not_processed.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Competency {competency_id} appears more than once in the set")]
    DuplicateItem { competency_id: DbId },

    #[error("Required level {level} is outside the scale {min}..={max}")]
    InvalidLevel { level: Level, min: Level, max: Level },

    #[error(
        "Partial apply: {} {} succeeded, {} failed, {} not processed",
        .0.succeeded.len(),
        .0.target,
        .0.failed.len(),
        .0.not_processed.len()
    )]
    PartialApply(Box<PartialApplyReport>),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Stale update: {0}")]
    ConflictStale(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backing store call '{operation}' timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("Backing store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    /// Wrap an arbitrary backing-store error without altering it.
    pub fn store(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Store(err.into())
    }

    /// Whether the caller may reasonably retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<PartialApplyReport> for CoreError {
    fn from(report: PartialApplyReport) -> Self {
        Self::PartialApply(Box::new(report))
    }
}
