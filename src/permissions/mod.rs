use serde::{Deserialize, Serialize};

pub mod source;
pub mod store;

pub use source::{InMemoryPermissionSource, PermissionSource, PgPermissionSource, SourceError};
pub use store::{PermissionStore, PERMISSION_CACHE_KEY};

/// A module-level grant. `module` is the unit of permission granularity;
/// `actions` is carried in the snapshot but not consulted by authorization,
/// which matches on module presence only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub module: String,
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
