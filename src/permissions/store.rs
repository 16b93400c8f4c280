use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{PermissionRecord, PermissionSource, SourceError};
use crate::cache::Cache;

/// Fixed cache key under which the serialized permission snapshot lives.
pub const PERMISSION_CACHE_KEY: &str = "permission";

/// Write-through cache in front of the durable permission source.
///
/// All cache-backend failures degrade to a miss: `get` never errors, and a
/// failed write during `refresh` still returns the freshly loaded records.
/// Concurrent refreshes are allowed; the snapshot is a full replacement
/// under one key, so the last write wins.
pub struct PermissionStore {
    cache: Arc<dyn Cache>,
    source: Arc<dyn PermissionSource>,
    ttl: Duration,
}

impl PermissionStore {
    pub fn new(cache: Arc<dyn Cache>, source: Arc<dyn PermissionSource>, ttl: Duration) -> Self {
        Self { cache, source, ttl }
    }

    /// Cache read. Backend errors and undecodable values are logged and
    /// treated as a miss.
    pub async fn get(&self) -> Option<Vec<PermissionRecord>> {
        let raw = match self.cache.get(PERMISSION_CACHE_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(%err, "permission cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(err) => {
                warn!(%err, "cached permission snapshot undecodable, treating as miss");
                None
            }
        }
    }

    /// Reload the full set from the durable source and write it through to
    /// the cache with the configured TTL.
    pub async fn refresh(&self) -> Result<Vec<PermissionRecord>, SourceError> {
        let records = self.source.find_all().await?;

        match serde_json::to_string(&records) {
            Ok(raw) => {
                if let Err(err) = self.cache.set(PERMISSION_CACHE_KEY, raw, self.ttl).await {
                    warn!(%err, "permission cache write failed");
                }
            }
            Err(err) => warn!(%err, "failed to serialize permission snapshot"),
        }

        Ok(records)
    }

    /// Drop the cached snapshot. Wired to permission mutations so a change
    /// takes effect before the TTL would have expired it.
    pub async fn invalidate(&self) {
        if let Err(err) = self.cache.del(PERMISSION_CACHE_KEY).await {
            warn!(%err, "permission cache invalidation failed");
        }
    }
}
