use axum::http::Method;
use tracing::debug;

use super::Identity;
use crate::permissions::PermissionRecord;

/// Position of the module name in a `/api/v1/<module>/...` path, counting
/// segments produced by splitting on `/` (the leading empty segment included).
const MODULE_SEGMENT_INDEX: usize = 3;

/// The inbound request as the decision engine sees it.
#[derive(Debug)]
pub struct RouteDescriptor<'a> {
    pub path: &'a str,
    /// Carried for logging; authorization is module-only and ignores the
    /// HTTP method (see `authorize`).
    pub method: Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No permission snapshot, or an empty one.
    NoPermissionSet,
    /// The snapshot has no record for the requested module.
    ModuleNotPermitted,
}

/// Derive the module name from a request path: strip any query string, then
/// take the fixed positional segment after the `/api/v1` prefix.
pub fn module_from_path(path: &str) -> Option<&str> {
    let path = path.split('?').next().unwrap_or(path);
    path.split('/')
        .nth(MODULE_SEGMENT_INDEX)
        .filter(|segment| !segment.is_empty())
}

/// Decide whether `identity` may access `route` given the permission
/// snapshot. Matching is exact and case-sensitive on the module name.
///
/// Deliberately action-blind: a record for the module grants every HTTP
/// method, regardless of the record's `actions`. Mapping GET/POST/... onto
/// action codes is an open product question, not implemented here.
pub fn authorize(
    identity: &Identity,
    route: &RouteDescriptor,
    permissions: &[PermissionRecord],
) -> Decision {
    if permissions.is_empty() {
        return Decision::Deny(DenyReason::NoPermissionSet);
    }

    let Some(module) = module_from_path(route.path) else {
        return Decision::Deny(DenyReason::ModuleNotPermitted);
    };

    if permissions.iter().any(|record| record.module == module) {
        debug!(
            subject = %identity.subject_id,
            module,
            method = %route.method,
            "request authorized"
        );
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::ModuleNotPermitted)
    }
}
