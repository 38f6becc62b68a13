//! Offline validation of a local CSV file.
//!
//! Runs the same chunking and validation as an upload, but stages and loads
//! nothing. Useful for checking a file before sending it to the API.

use anyhow::{Context, Result};
use std::path::Path;

use crate::chunk::ChunkReader;
use crate::error::IngestError;
use crate::ingest::check_file_format;
use crate::schema::{schema_for, RecordType};
use crate::validate::validate;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub chunks: usize,
    pub rows: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Validate `contents` chunk by chunk.
///
/// Fails on the first chunk with no surviving rows, as an upload would.
pub fn check_contents(
    record_type: RecordType,
    contents: &[u8],
    chunk_size: usize,
) -> Result<CheckReport, IngestError> {
    let schema = schema_for(record_type);
    let mut report = CheckReport::default();

    for chunk in ChunkReader::new(contents, schema, chunk_size) {
        let chunk = chunk?;
        report.rows += chunk.rows.len();
        let outcome = validate(chunk, schema)?;
        report.chunks += 1;
        report.accepted += outcome.survivors.len();
        report.rejected += outcome.rejected.len();
    }

    Ok(report)
}

pub fn run_check(record_type: RecordType, path: &Path, chunk_size: usize) -> Result<()> {
    let filename = path.file_name().and_then(|n| n.to_str());
    check_file_format(filename)?;

    let contents =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let report = check_contents(record_type, &contents, chunk_size)?;

    if report.rows == 0 {
        anyhow::bail!("{} contains no rows", path.display());
    }

    println!("check {}", record_type);
    println!("  chunks: {}", report.chunks);
    println!("  rows read: {}", report.rows);
    println!("  rows accepted: {}", report.accepted);
    println!("  rows rejected: {}", report.rejected);
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let csv = "1,Dev\n,Ops\n3,QA\n4,\n5,PM\n";
        let report = check_contents(RecordType::Jobs, csv.as_bytes(), 2).unwrap();
        assert_eq!(
            report,
            CheckReport {
                chunks: 3,
                rows: 5,
                accepted: 3,
                rejected: 2,
            }
        );
    }

    #[test]
    fn test_exhausted_chunk_fails() {
        let csv = "1,Dev\n2,Ops\n,\n,\n";
        let err = check_contents(RecordType::Jobs, csv.as_bytes(), 2).unwrap_err();
        assert!(matches!(err, IngestError::EmptyAfterValidation { chunk: 1, .. }));
    }
}
