use anyhow::Result;
use tracing::info;

use crate::loader::BulkLoader;
use crate::schema::{schema_for, RecordType};

/// Create the three destination tables. Safe to run repeatedly.
pub async fn run_migrations(loader: &BulkLoader) -> Result<()> {
    let statements: Vec<String> = RecordType::ALL
        .iter()
        .map(|rt| schema_for(*rt).create_table_sql())
        .collect();

    loader.execute_plain(&statements).await?;
    info!(tables = statements.len(), "warehouse tables ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AwsCredentials;
    use crate::warehouse::MemoryWarehouse;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_creates_all_tables() {
        let warehouse = Arc::new(MemoryWarehouse::new());
        let loader = BulkLoader::new(
            warehouse.clone(),
            AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            },
        );

        run_migrations(&loader).await.unwrap();
        run_migrations(&loader).await.unwrap();

        let statements = warehouse.statements();
        assert_eq!(statements.len(), 6);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS departments"));
        assert!(statements[2].starts_with("CREATE TABLE IF NOT EXISTS hired_employees"));
    }
}
