//! Custom error types for the common library
//!
//! This module defines the errors returned by the data-access layer of
//! every service.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A unique constraint rejected the write
    #[error("Duplicate value violates {0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected the write
    #[error("Referenced row missing or still in use ({0})")]
    ForeignKeyViolation(String),

    /// A stored value could not be mapped back to its domain type
    #[error("Corrupt row: {0}")]
    Decode(String),

    /// The write would break a business invariant
    #[error("{0}")]
    Conflict(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return DatabaseError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return DatabaseError::ForeignKeyViolation(constraint);
            }
        }
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_query_errors() {
        let err: DatabaseError = SqlxError::RowNotFound.into();
        assert!(matches!(err, DatabaseError::Query(SqlxError::RowNotFound)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            DatabaseError::UniqueViolation("users_email_key".to_string()).to_string(),
            "Duplicate value violates users_email_key"
        );
        assert_eq!(
            DatabaseError::Conflict("Stock insuffisant".to_string()).to_string(),
            "Stock insuffisant"
        );
    }
}
