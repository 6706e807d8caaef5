//! Error taxonomy shared by the catalog, ledger and seat engine.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("No available seats for this route")]
    NoSeatsAvailable,

    #[error("{0}")]
    Validation(String),

    /// The audit row could not be written, the decision was rolled back.
    #[error("Failed to log the operation, order left unchanged: {0}")]
    AuditLog(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn invalid_state(what: impl Into<String>) -> Self {
        ServiceError::InvalidState(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        ServiceError::Validation(what.into())
    }

    /// Connection level failures are the only ones worth a reconnect.
    pub fn is_storage(&self) -> bool {
        matches!(self, ServiceError::Storage(_))
    }
}

impl From<DieselError> for ServiceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ServiceError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ServiceError::Validation(format!("Duplicate entry: {}", info.message()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                ServiceError::Validation(format!("Referenced record missing: {}", info.message()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::__Unknown, info)
                if info.message().contains("CHECK constraint failed") =>
            {
                ServiceError::Validation(format!("Value out of range: {}", info.message()))
            }
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for ServiceError {
    fn from(err: diesel::ConnectionError) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<diesel_migrations::RunMigrationsError> for ServiceError {
    fn from(err: diesel_migrations::RunMigrationsError) -> Self {
        ServiceError::Storage(format!("migration failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
