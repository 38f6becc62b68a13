//! Bulk loading of staged objects into the warehouse.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::commands::{copy_from, BulkCommand, DataFormat};
use crate::compensate::compensate;
use crate::error::{IngestError, WarehouseError};
use crate::models::LoadResult;
use crate::schema::RecordSchema;
use crate::staging::StagingStore;
use crate::storage::AwsCredentials;
use crate::warehouse::{Warehouse, WarehouseSession};

#[derive(Clone)]
pub struct BulkLoader {
    warehouse: Arc<dyn Warehouse>,
    creds: AwsCredentials,
}

impl BulkLoader {
    pub fn new(warehouse: Arc<dyn Warehouse>, creds: AwsCredentials) -> Self {
        Self { warehouse, creds }
    }

    /// Copy every location into `schema`'s table, one committed statement
    /// per location, in the order given.
    ///
    /// Stops at the first failure. The staged objects for all `locations`
    /// are then deleted before the error is returned; rows committed by
    /// earlier locations stay in the table.
    pub async fn load(
        &self,
        staging: &StagingStore,
        locations: &[String],
        schema: &RecordSchema,
        format: DataFormat,
    ) -> Result<LoadResult, IngestError> {
        info!(table = schema.table(), count = locations.len(), "loading staged objects");

        let commands: Vec<BulkCommand> = locations
            .iter()
            .map(|location| copy_from(schema, location, format))
            .collect();

        match self.run(&commands).await {
            Ok(()) => Ok(LoadResult::success(
                schema.table(),
                locations.to_vec(),
                format!(
                    "Files {:?} were uploaded into {} correctly!",
                    locations,
                    schema.table()
                ),
            )),
            Err(err) => {
                error!(table = schema.table(), error = %err, "bulk load failed");
                compensate(staging, locations).await;
                Err(IngestError::LoadFailed(err))
            }
        }
    }

    /// Run commands sequentially on one connection, each in its own
    /// transaction, aborting on the first failure.
    pub async fn run(&self, commands: &[BulkCommand]) -> Result<(), WarehouseError> {
        let statements = commands
            .iter()
            .map(|command| (command.to_string(), command.render(&self.creds)))
            .collect();
        self.execute_all(statements).await
    }

    /// Like [`run`](Self::run), for statements that carry no credentials.
    pub async fn execute_plain(&self, statements: &[String]) -> Result<(), WarehouseError> {
        let statements = statements
            .iter()
            .map(|statement| (statement.clone(), statement.clone()))
            .collect();
        self.execute_all(statements).await
    }

    /// `(logged, executed)` pairs.
    async fn execute_all(&self, statements: Vec<(String, String)>) -> Result<(), WarehouseError> {
        let mut session = self.warehouse.connect().await?;

        for (logged, sql) in &statements {
            info!(statement = %logged, "executing");
            if let Err(err) = session.execute_committed(sql).await {
                close_quietly(session).await;
                return Err(err);
            }
        }

        close_quietly(session).await;
        Ok(())
    }
}

async fn close_quietly(session: Box<dyn WarehouseSession>) {
    if let Err(err) = session.close().await {
        warn!(error = %err, "failed to close warehouse connection");
    }
}
