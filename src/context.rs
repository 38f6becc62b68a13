//! Wiring of the pipeline components.
//!
//! An [`IngestContext`] is built once at startup from the loaded [`Config`]
//! and shared (behind an `Arc`) by every request. It holds no per-request
//! state: each upload owns its own run and warehouse connection.

use anyhow::Result;
use std::sync::Arc;

use crate::backup::BackupOrchestrator;
use crate::config::Config;
use crate::ingest::Ingestor;
use crate::loader::BulkLoader;
use crate::staging::StagingStore;
use crate::storage::{AwsCredentials, ObjectStore, S3Store};
use crate::warehouse::{PgWarehouse, Warehouse};

pub struct IngestContext {
    pub config: Arc<Config>,
    pub ingestor: Ingestor,
    pub backups: BackupOrchestrator,
    pub loader: BulkLoader,
}

impl IngestContext {
    /// Assemble the pipeline from explicit collaborators.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ObjectStore>,
        warehouse: Arc<dyn Warehouse>,
        creds: AwsCredentials,
    ) -> Self {
        let staging = StagingStore::new(store);
        let loader = BulkLoader::new(warehouse, creds);
        let backups = BackupOrchestrator::new(loader.clone(), staging.bucket());
        let ingestor = Ingestor::new(staging, loader.clone(), config.ingest.chunk_size);

        Self {
            config,
            ingestor,
            backups,
            loader,
        }
    }

    /// Production wiring: S3 for staging, Redshift over the Postgres protocol.
    ///
    /// Reads AWS credentials from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let creds = AwsCredentials::from_env()?;
        let store = Arc::new(S3Store::new(config.storage.clone(), creds.clone()));
        let warehouse = Arc::new(PgWarehouse::from_config(&config.warehouse));
        Ok(Self::new(
            Arc::new(config.clone()),
            store,
            warehouse,
            creds,
        ))
    }
}
