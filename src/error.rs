//! Error types for the ingestion pipeline and its storage/warehouse seams.
//!
//! Every variant of [`IngestError`] is surfaced to HTTP clients as a 400 with
//! the variant's display text. [`StoreError`] and [`WarehouseError`] carry the
//! raw backend message so it can be passed through unchanged.

use thiserror::Error;

/// Failures reported by an [`ObjectStore`](crate::storage::ObjectStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request for s3://{bucket}/{key} failed: {message}")]
    Request {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("S3 {operation} failed (HTTP {status}) for key '{key}': {body}")]
    Status {
        operation: &'static str,
        status: u16,
        key: String,
        body: String,
    },
}

/// Failures reported by a [`Warehouse`](crate::warehouse::Warehouse).
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("timed out connecting to warehouse after {0}s")]
    ConnectTimeout(u64),

    /// Raw backend error text, as reported by the database server.
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for WarehouseError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) => WarehouseError::Backend(db_err.message().to_string()),
            None => WarehouseError::Backend(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// Missing file, wrong extension or an upload without rows.
    #[error("{0}")]
    InputFormat(String),

    #[error("failed to parse CSV: {0}")]
    Parse(String),

    /// Every row of a chunk failed validation.
    #[error(
        "chunk {chunk} has no valid rows after validation. Expected columns: {}",
        expected_columns.join(", ")
    )]
    EmptyAfterValidation {
        chunk: usize,
        expected_columns: Vec<String>,
    },

    #[error("failed to stage chunk: {0}")]
    StagingWriteFailed(#[source] StoreError),

    #[error("{0}")]
    LoadFailed(#[source] WarehouseError),

    #[error("invalid storage location: '{0}'. Expected s3://<bucket>/<key>")]
    InvalidLocation(String),

    #[error("unknown table: '{0}'. Must be departments, jobs, or hired_employees")]
    UnknownTable(String),
}
