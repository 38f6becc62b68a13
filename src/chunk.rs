//! Headerless CSV reader that yields bounded [`RawChunk`]s.
//!
//! Fields are mapped to schema columns by position. Rows shorter than the
//! schema are padded with empty strings (so the nullability check rejects
//! them); fields past the last schema column are ignored.

use std::io::Read;

use crate::error::IngestError;
use crate::models::{RawChunk, Row};
use crate::schema::RecordSchema;

/// Lazily splits a CSV stream into chunks of at most `chunk_size` rows.
///
/// Chunks are produced in order with contiguous indices starting at 0.
/// A parse error ends the iteration after it is returned.
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    width: usize,
    chunk_size: usize,
    next_chunk: usize,
    next_row: usize,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(input: R, schema: &RecordSchema, chunk_size: usize) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        Self {
            reader,
            width: schema.columns.len(),
            chunk_size: chunk_size.max(1),
            next_chunk: 0,
            next_row: 0,
            done: false,
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<RawChunk, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut rows = Vec::with_capacity(self.chunk_size);
        let mut record = csv::StringRecord::new();

        while rows.len() < self.chunk_size {
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    let values = (0..self.width)
                        .map(|i| record.get(i).unwrap_or("").to_string())
                        .collect();
                    rows.push(Row {
                        index: self.next_row,
                        values,
                    });
                    self.next_row += 1;
                }
                Ok(false) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(IngestError::Parse(e.to_string())));
                }
            }
        }

        if rows.is_empty() {
            return None;
        }

        let chunk = RawChunk {
            index: self.next_chunk,
            rows,
        };
        self.next_chunk += 1;
        Some(Ok(chunk))
    }
}

/// Read the whole input eagerly into chunks.
pub fn split_chunks(
    input: &[u8],
    schema: &RecordSchema,
    chunk_size: usize,
) -> Result<Vec<RawChunk>, IngestError> {
    ChunkReader::new(input, schema, chunk_size).collect()
}

/// Serialize rows as CSV with a header line in schema column order.
///
/// The header is skipped by the bulk-copy command (`IGNOREHEADER 1`).
pub fn encode_csv(rows: &[Row], schema: &RecordSchema) -> Result<Vec<u8>, IngestError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(schema.column_names())
        .map_err(|e| IngestError::Parse(e.to_string()))?;
    for row in rows {
        writer
            .write_record(&row.values)
            .map_err(|e| IngestError::Parse(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| IngestError::Parse(e.to_string()))
}
