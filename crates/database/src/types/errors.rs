//! Error types for the database layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("duplicate entity: {0}")]
    Duplicate(String),
}

impl DatabaseError {
    /// Map a driver error, turning unique constraint violations into [`DatabaseError::Duplicate`].
    pub fn from_write(error: sqlx::Error, entity: &str) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Duplicate(entity.to_string())
            }
            _ => Self::Query(error),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}
