use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use competency_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`]; backing-store errors are already classified by the
/// store adapter. Implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `competency_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, machine-readable code, message and any extra body fields.
type Classified = (StatusCode, &'static str, String, Option<(&'static str, Value)>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, extra) = match &self {
            AppError::Core(core) => classify_core_error(core),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some((key, value)) = extra {
            body[key] = value;
        }

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> Classified {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            None,
        ),
        CoreError::DuplicateItem { .. } => {
            (StatusCode::CONFLICT, "DUPLICATE_ITEM", core.to_string(), None)
        }
        CoreError::InvalidLevel { .. } => {
            (StatusCode::BAD_REQUEST, "INVALID_LEVEL", core.to_string(), None)
        }
        CoreError::PartialApply(report) => (
            StatusCode::MULTI_STATUS,
            "PARTIAL_APPLY",
            core.to_string(),
            Some(("report", json!(report))),
        ),
        CoreError::PreconditionFailed(msg) => (
            StatusCode::PRECONDITION_FAILED,
            "PRECONDITION_FAILED",
            msg.clone(),
            None,
        ),
        CoreError::ConflictStale(msg) => (StatusCode::CONFLICT, "STALE", msg.clone(), None),
        CoreError::Validation(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
        }
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        CoreError::Unauthorized(msg) => {
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
        }
        CoreError::Timeout { .. } => {
            tracing::warn!(error = %core, "Backing store timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "TIMEOUT",
                core.to_string(),
                Some(("retryable", Value::Bool(true))),
            )
        }
        CoreError::Store(err) => {
            tracing::error!(error = %err, "Backing store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use competency_core::error::{FailedTarget, PartialApplyReport};

    use super::*;

    fn status_of(err: CoreError) -> StatusCode {
        AppError::Core(err).into_response().status()
    }

    #[test]
    fn core_errors_map_to_statuses() {
        assert_eq!(
            status_of(CoreError::NotFound {
                entity: "CompetencySet",
                id: 9
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CoreError::DuplicateItem { competency_id: 3 }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::InvalidLevel {
                level: 9,
                min: 1,
                max: 5
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::ConflictStale("changed".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::PreconditionFailed("no user".into())),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status_of(CoreError::Timeout {
                operation: "list_items",
                secs: 10
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(CoreError::store("connection reset")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    /// Unique violations arrive from the store adapter as `Conflict`.
    #[tokio::test]
    async fn store_conflict_is_409_with_code() {
        let response = AppError::Core(CoreError::Conflict(
            "Duplicate value violates uq_competency_sets_name".into(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "CONFLICT");
    }

    #[test]
    fn partial_apply_is_multi_status() {
        let report = PartialApplyReport {
            target: "competency",
            succeeded: vec![1],
            failed: vec![FailedTarget {
                id: 2,
                reason: "boom".into(),
            }],
            not_processed: vec![],
        };
        assert_eq!(status_of(report.into()), StatusCode::MULTI_STATUS);
    }
}
