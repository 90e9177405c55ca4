use thiserror::Error;

/// Failures surfaced by the storage facade. Lookups that find nothing are
/// not errors; they return `Option`/empty collections instead.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("a user with email `{email}` already exists")]
    DuplicateEmail { email: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
