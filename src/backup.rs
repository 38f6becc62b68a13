//! Table backup to, and restore from, Parquet in object storage.
//!
//! Independent of the upload pipeline: nothing is staged, so a failed
//! backup or restore has nothing to compensate.

use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use crate::commands::{copy_from, unload_table, DataFormat};
use crate::error::IngestError;
use crate::loader::BulkLoader;
use crate::models::LoadResult;
use crate::schema::{schema_for, RecordType};
use crate::storage::location_for;

#[derive(Clone)]
pub struct BackupOrchestrator {
    loader: BulkLoader,
    bucket: String,
}

impl BackupOrchestrator {
    pub fn new(loader: BulkLoader, bucket: impl Into<String>) -> Self {
        Self {
            loader,
            bucket: bucket.into(),
        }
    }

    /// Unload the full table as Parquet part-files under
    /// `backup_{table}/{today}_`.
    pub async fn backup(&self, table: RecordType) -> Result<LoadResult, IngestError> {
        self.backup_on(table, Utc::now().date_naive()).await
    }

    pub async fn backup_on(
        &self,
        table: RecordType,
        date: NaiveDate,
    ) -> Result<LoadResult, IngestError> {
        let prefix = backup_prefix(&self.bucket, table, date);
        info!(%table, %prefix, "backing up table");

        self.loader
            .run(&[unload_table(table, &prefix)])
            .await
            .map_err(|err| {
                error!(%table, error = %err, "backup failed");
                IngestError::LoadFailed(err)
            })?;

        Ok(LoadResult::success(
            table.as_str(),
            vec![prefix.clone()],
            format!("Table {} was backed up to {}", table, prefix),
        ))
    }

    /// Load Parquet files at `location` into `table`.
    pub async fn restore(
        &self,
        location: &str,
        table: RecordType,
    ) -> Result<LoadResult, IngestError> {
        let location = location.trim();
        if !is_storage_location(location) {
            return Err(IngestError::InvalidLocation(location.to_string()));
        }
        info!(%table, %location, "restoring table");

        let command = copy_from(schema_for(table), location, DataFormat::Parquet);
        self.loader.run(&[command]).await.map_err(|err| {
            error!(%table, error = %err, "restore failed");
            IngestError::LoadFailed(err)
        })?;

        Ok(LoadResult::success(
            table.as_str(),
            vec![location.to_string()],
            format!("Backup {} was restored into {}", location, table),
        ))
    }
}

/// `s3://{bucket}/backup_{table}/{date}_`
pub fn backup_prefix(bucket: &str, table: RecordType, date: NaiveDate) -> String {
    location_for(
        bucket,
        &format!("backup_{}/{}_", table, date.format("%Y-%m-%d")),
    )
}

fn is_storage_location(location: &str) -> bool {
    location
        .strip_prefix("s3://")
        .and_then(|rest| rest.split_once('/'))
        .map(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
        .unwrap_or(false)
}
