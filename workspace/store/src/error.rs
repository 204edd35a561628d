use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{debug, error};
use validator::ValidationErrors;

/// Error types for the data-access layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unclassified failure reported by the database driver
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Input rejected before touching the database
    #[error("Validation error: {0}")]
    Validation(String),

    /// A row the operation depends on does not exist
    #[error("{0}")]
    NotFound(String),

    /// Unique or referential constraint violation
    #[error("{0}")]
    Conflict(String),

    /// Course has no free seats left
    #[error("Course {course_id} is full ({max_students} students)")]
    CapacityReached { course_id: i32, max_students: i32 },

    /// Unknown email or wrong password; deliberately does not say which
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Hashing a secret failed
    #[error("Credential error: {0}")]
    Credential(String),
}

impl StoreError {
    pub fn not_found(entity: &str, id: i32) -> Self {
        StoreError::NotFound(format!("{} with ID {} not found", entity, id))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                debug!("Unique constraint violated: {}", msg);
                return StoreError::Conflict(format!("Duplicate value: {}", msg));
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                debug!("Foreign key constraint violated: {}", msg);
                return StoreError::Conflict(format!("Referenced row missing or still in use: {}", msg));
            }
            _ => {}
        }

        // Some drivers only surface the constraint name in the message
        let message = err.to_string().to_lowercase();
        if message.contains("unique constraint") || message.contains("duplicate key") {
            debug!("Unique constraint violated: {}", err);
            return StoreError::Conflict(format!("Duplicate value: {}", err));
        }
        if message.contains("foreign key constraint") {
            debug!("Foreign key constraint violated: {}", err);
            return StoreError::Conflict(format!("Referenced row missing or still in use: {}", err));
        }

        error!("Database error: {}", err);
        StoreError::Database(err)
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        debug!("Validation failed: {}", errors);
        StoreError::Validation(errors.to_string())
    }
}

/// Type alias for Result with StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
