use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Key-value cache seam consumed by the permission store. Implementations
/// report backend failures through `CacheError`; callers on the
/// authorization path must degrade those to a miss, never surface them.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
