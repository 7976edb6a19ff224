#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Table {table} is missing columns: {missing:?}")]
    ColumnMismatch { table: String, missing: Vec<String> },

    #[error("Staging column {0:?} has no destination column")]
    UnmappedColumn(String),

    #[error("Failed to read staging file: {0}")]
    Staging(#[from] crate::staging::StagingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
