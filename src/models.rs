//! Data types that flow through the upload pipeline.

use serde::Serialize;

use crate::schema::RecordType;

/// One CSV row, values in schema column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 0-based position of the row within the whole upload.
    pub index: usize,
    pub values: Vec<String>,
}

/// A bounded slice of an upload, processed as a unit.
#[derive(Debug, Clone)]
pub struct RawChunk {
    /// 0-based sequence number within the parent upload.
    pub index: usize,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub row: usize,
    pub column: &'static str,
    pub reason: &'static str,
}

/// Result of validating one chunk: survivors keep their relative order.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub chunk: usize,
    pub survivors: Vec<Row>,
    pub rejected: Vec<Rejection>,
}

/// Bytes persisted in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub key: String,
    /// `s3://{bucket}/{key}`
    pub location: String,
}

/// Objects staged by a single upload request, in staging order.
///
/// Owned by the request that created it and dropped when the request ends;
/// it only exists so a failure can delete what this run wrote.
#[derive(Debug)]
pub struct UploadRun {
    pub record_type: RecordType,
    staged: Vec<StagedObject>,
}

impl UploadRun {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            staged: Vec::new(),
        }
    }

    pub fn push(&mut self, object: StagedObject) {
        self.staged.push(object);
    }

    pub fn locations(&self) -> Vec<String> {
        self.staged.iter().map(|o| o.location.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }
}

/// Successful outcome of a load, backup, or restore.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadResult {
    pub status_code: u16,
    pub table: String,
    pub locations: Vec<String>,
    pub message: String,
}

impl LoadResult {
    pub fn success(table: impl Into<String>, locations: Vec<String>, message: String) -> Self {
        Self {
            status_code: 200,
            table: table.into(),
            locations,
            message,
        }
    }
}
