//! Row-level validation of a [`RawChunk`] against a [`RecordSchema`].

use tracing::{debug, warn};

use crate::error::IngestError;
use crate::models::{RawChunk, Rejection, ValidationOutcome};
use crate::schema::RecordSchema;

/// Split a chunk into surviving rows and rejections.
///
/// Each row is checked column by column, validators in declaration order;
/// the first failing validator rejects the row. Survivors keep their
/// original relative order. Fails with [`IngestError::EmptyAfterValidation`]
/// when no row survives.
pub fn validate(chunk: RawChunk, schema: &RecordSchema) -> Result<ValidationOutcome, IngestError> {
    let total = chunk.rows.len();
    let mut survivors = Vec::with_capacity(total);
    let mut rejected = Vec::new();

    for row in chunk.rows {
        match first_failure(&row.values, schema) {
            Some((column, reason)) => {
                warn!(
                    table = schema.table(),
                    chunk = chunk.index,
                    row = row.index,
                    column,
                    reason,
                    "rejecting row"
                );
                rejected.push(Rejection {
                    row: row.index,
                    column,
                    reason,
                });
            }
            None => survivors.push(row),
        }
    }

    debug!(
        table = schema.table(),
        chunk = chunk.index,
        total,
        accepted = survivors.len(),
        rejected = rejected.len(),
        "validated chunk"
    );

    if survivors.is_empty() {
        return Err(IngestError::EmptyAfterValidation {
            chunk: chunk.index,
            expected_columns: schema.column_names().iter().map(|c| c.to_string()).collect(),
        });
    }

    Ok(ValidationOutcome {
        chunk: chunk.index,
        survivors,
        rejected,
    })
}

fn first_failure(values: &[String], schema: &RecordSchema) -> Option<(&'static str, &'static str)> {
    for (column, value) in schema.columns.iter().zip(values) {
        if let Some(v) = column.validators.iter().find(|v| !v.check(value)) {
            return Some((column.name, v.name()));
        }
    }
    None
}
