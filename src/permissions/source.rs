use async_trait::async_trait;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;

use super::PermissionRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("permission source unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        SourceError::Unavailable(err.to_string())
    }
}

/// Durable, authoritative source of the full permission set. Consumed by the
/// permission store as its cache-refill origin.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn find_all(&self) -> Result<Vec<PermissionRecord>, SourceError>;
}

pub struct PgPermissionSource {
    pool: PgPool,
}

impl PgPermissionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionSource for PgPermissionSource {
    async fn find_all(&self) -> Result<Vec<PermissionRecord>, SourceError> {
        let rows = sqlx::query("SELECT module, actions, description FROM permissions ORDER BY module")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PermissionRecord {
                module: row.get("module"),
                actions: row.get("actions"),
                description: row.get("description"),
            })
            .collect())
    }
}

/// In-memory source for tests and local development. `replace` swaps the
/// whole set, mirroring how permission mutations land in the durable store.
#[derive(Default)]
pub struct InMemoryPermissionSource {
    records: RwLock<Vec<PermissionRecord>>,
}

impl InMemoryPermissionSource {
    pub fn new(records: Vec<PermissionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn replace(&self, records: Vec<PermissionRecord>) {
        *self.records.write().await = records;
    }
}

#[async_trait]
impl PermissionSource for InMemoryPermissionSource {
    async fn find_all(&self) -> Result<Vec<PermissionRecord>, SourceError> {
        Ok(self.records.read().await.clone())
    }
}
