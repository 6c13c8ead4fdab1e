use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The program moved on since it was read; nothing was written.
    #[error("version conflict on program {program_id}: expected {expected}, found {found}")]
    VersionConflict {
        program_id: String,
        expected: u64,
        found: u64,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("backend error: {0}")]
    Backend(String),
}
