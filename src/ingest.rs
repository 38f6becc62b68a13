//! Upload pipeline orchestration.
//!
//! Coordinates one upload: file check → chunking → validation → staging →
//! bulk load. Chunks are handled strictly in order; chunk `i + 1` is not
//! read until chunk `i` has been staged.
//!
//! Any failure after the first object has been staged deletes every object
//! this run staged before the error is returned.

use tracing::{info, warn};

use crate::chunk::{encode_csv, ChunkReader};
use crate::commands::DataFormat;
use crate::compensate::compensate;
use crate::error::IngestError;
use crate::loader::BulkLoader;
use crate::models::{LoadResult, UploadRun};
use crate::schema::{schema_for, RecordSchema, RecordType};
use crate::staging::StagingStore;
use crate::validate::validate;

#[derive(Clone)]
pub struct Ingestor {
    staging: StagingStore,
    loader: BulkLoader,
    chunk_size: usize,
}

impl Ingestor {
    pub fn new(staging: StagingStore, loader: BulkLoader, chunk_size: usize) -> Self {
        Self {
            staging,
            loader,
            chunk_size,
        }
    }

    pub async fn upload(
        &self,
        record_type: RecordType,
        filename: Option<&str>,
        contents: &[u8],
    ) -> Result<LoadResult, IngestError> {
        check_file_format(filename)?;
        info!(table = %record_type, file = filename.unwrap_or_default(), bytes = contents.len(), "processing upload");

        let schema = schema_for(record_type);
        let mut run = UploadRun::new(record_type);

        if let Err(err) = self.stage_chunks(contents, schema, &mut run).await {
            warn!(table = %record_type, error = %err, staged = run.len(), "upload aborted before load");
            compensate(&self.staging, &run.locations()).await;
            return Err(err);
        }

        if run.is_empty() {
            return Err(IngestError::InputFormat(
                "The file contains no rows".to_string(),
            ));
        }

        let locations = run.locations();
        info!(table = %record_type, ?locations, "all chunks staged");
        self.loader
            .load(&self.staging, &locations, schema, DataFormat::Csv)
            .await
    }

    async fn stage_chunks(
        &self,
        contents: &[u8],
        schema: &RecordSchema,
        run: &mut UploadRun,
    ) -> Result<(), IngestError> {
        for chunk in ChunkReader::new(contents, schema, self.chunk_size) {
            let outcome = validate(chunk?, schema)?;
            let index = outcome.chunk;
            if !outcome.rejected.is_empty() {
                warn!(
                    table = %run.record_type,
                    chunk = index,
                    rejected = outcome.rejected.len(),
                    "rows skipped"
                );
            }
            let bytes = encode_csv(&outcome.survivors, schema)?;
            let staged = self.staging.put(bytes, run.record_type, index).await?;
            run.push(staged);
        }
        Ok(())
    }
}

/// Uploads must be named `*.csv`.
pub fn check_file_format(filename: Option<&str>) -> Result<(), IngestError> {
    let Some(filename) = filename else {
        return Err(IngestError::InputFormat("No file found!".to_string()));
    };
    if !filename.to_ascii_lowercase().ends_with(".csv") {
        return Err(IngestError::InputFormat(format!(
            "Unsupported file type: {}. Supported type is CSV",
            filename
        )));
    }
    Ok(())
}
