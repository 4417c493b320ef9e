// ==========================================
// Mission Match Engine - API Error Types
// ==========================================
// Surface errors for callers. Everything concurrency-shaped collapses
// into Conflict: the caller's move is always the same, re-query and
// retry. Field-level problems stay field-level so forms can point at
// the offending input.
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ===== Caller input =====
    #[error("validation failed (field={field}): {message}")]
    Validation { field: String, message: String },

    #[error("not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// Lost races, illegal transitions, duplicate dispatches. Maps to
    /// HTTP 409 on a REST transport.
    #[error("conflict: {0}")]
    Conflict(String),

    // ===== Infrastructure =====
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("import failed: {0}")]
    ImportError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// From RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // concurrency and state: caller re-queries, then retries
            RepositoryError::StateConflict { message } => ApiError::Conflict(message),
            RepositoryError::StatusCasFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::Conflict(format!(
                "concurrent update on {} id={}: expected status {}, found {}",
                entity, id, expected, actual
            )),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::Conflict(format!("illegal transition {} -> {}", from, to))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("duplicate: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::Conflict(format!("referenced record missing: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::Conflict(msg),

            // lookups
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },

            // caller input
            RepositoryError::FieldValueError { field, message } => {
                ApiError::Validation { field, message }
            }
            RepositoryError::ValidationError(msg) => ApiError::Validation {
                field: "request".to_string(),
                message: msg,
            },

            // infrastructure
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock acquisition failed: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            // generic
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_entity_and_id() {
        let repo_err = RepositoryError::NotFound {
            entity: "Mission".to_string(),
            id: "m-404".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound { entity, id } => {
                assert_eq!(entity, "Mission");
                assert_eq!(id, "m-404");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_cas_failure_becomes_conflict() {
        let repo_err = RepositoryError::StatusCasFailure {
            entity: "Mission".to_string(),
            id: "m-1".to_string(),
            expected: "MATCHING".to_string(),
            actual: "CONFIRMED".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::Conflict(msg) => {
                assert!(msg.contains("m-1"));
                assert!(msg.contains("MATCHING"));
                assert!(msg.contains("CONFIRMED"));
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_illegal_transition_becomes_conflict() {
        let repo_err = RepositoryError::InvalidStateTransition {
            from: "COMPLETED".to_string(),
            to: "MATCHING".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        assert!(matches!(api_err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_field_error_stays_field_scoped() {
        let repo_err = RepositoryError::FieldValueError {
            field: "wave_size".to_string(),
            message: "must be at least 1".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::Validation { field, message } => {
                assert_eq!(field, "wave_size");
                assert!(message.contains("at least 1"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
