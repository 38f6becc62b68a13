//! Staging of cleaned chunks in object storage.
//!
//! Keys follow `{table}/{uuid}_chunk{index}.csv`. Staged objects are left in
//! place after a successful load; they are only removed by compensation.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::IngestError;
use crate::models::StagedObject;
use crate::schema::RecordType;
use crate::storage::{key_from_location, location_for, ObjectStore};

#[derive(Clone)]
pub struct StagingStore {
    store: Arc<dyn ObjectStore>,
}

impl StagingStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Write one cleaned chunk and return where it landed.
    pub async fn put(
        &self,
        bytes: Vec<u8>,
        table: RecordType,
        index: usize,
    ) -> Result<StagedObject, IngestError> {
        let key = staging_key(table, &Uuid::new_v4().to_string(), index);
        let size = bytes.len();

        self.store
            .put(&key, bytes)
            .await
            .map_err(IngestError::StagingWriteFailed)?;

        let location = location_for(self.store.bucket(), &key);
        info!(%table, chunk = index, bytes = size, %location, "staged chunk");

        Ok(StagedObject { key, location })
    }

    /// Best-effort delete of previously staged locations, as one batch.
    ///
    /// Failures are logged per location and counted, never returned.
    /// Returns the number of locations that could not be deleted.
    pub async fn delete_many(&self, locations: &[String]) -> usize {
        let mut failures = 0;
        let mut keys = Vec::with_capacity(locations.len());
        for location in locations {
            match key_from_location(location) {
                Some(key) => keys.push(key.to_string()),
                None => {
                    warn!(%location, "cannot derive object key from location, skipping delete");
                    failures += 1;
                }
            }
        }
        if keys.is_empty() {
            return failures;
        }

        match self.store.delete_many(&keys).await {
            Ok(refused) => {
                for failure in &refused {
                    warn!(
                        key = %failure.key,
                        code = %failure.code,
                        message = %failure.message,
                        "failed to delete staged object"
                    );
                }
                failures += refused.len();
            }
            Err(err) => {
                for key in &keys {
                    warn!(%key, error = %err, "failed to delete staged object");
                }
                failures += keys.len();
            }
        }
        failures
    }
}

pub fn staging_key(table: RecordType, id: &str, index: usize) -> String {
    format!("{}/{}_chunk{}.csv", table, id, index)
}
