use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Circuit open: {0}")]
    CircuitOpen(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, safe to expose to API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Network(_) => "network_error",
            AppError::Timeout(_) => "timeout",
            AppError::Upstream { .. } => "upstream_error",
            AppError::CircuitOpen(_) => "circuit_open",
            AppError::Persistence(_) => "persistence_error",
            AppError::Cache(_) => "cache_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Transient failures worth retrying at the gateway: network faults,
    /// timeouts, HTTP 429 and 5xx. Other 4xx are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => true,
            AppError::Upstream { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => AppError::NotFound("Record not found in database".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Conflict(format!("Duplicate record: {}", info.message()))
            }
            _ => AppError::Persistence(err.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        AppError::Persistence(format!("Database pool error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::Network("Failed to connect to external source".to_string())
        } else if let Some(status) = err.status() {
            AppError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Validation(format!("Invalid date/time: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::Validation("x".into()).code(), "validation_error");
        assert_eq!(
            AppError::Upstream {
                status: 502,
                message: "bad gateway".into()
            }
            .code(),
            "upstream_error"
        );
        assert_eq!(AppError::CircuitOpen("x".into()).code(), "circuit_open");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Network("refused".into()).is_retryable());
        assert!(AppError::Timeout("slow".into()).is_retryable());
        assert!(AppError::Upstream {
            status: 429,
            message: "rate limited".into()
        }
        .is_retryable());
        assert!(AppError::Upstream {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!AppError::Upstream {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
        assert!(!AppError::Validation("bad id".into()).is_retryable());
        assert!(!AppError::CircuitOpen("open".into()).is_retryable());
    }
}
