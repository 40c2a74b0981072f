use async_trait::async_trait;
use serde_json::Value;

use crate::auth::SessionContext;
use crate::error::Result;

/// Minimal read/partial-update surface the updater needs from the service.
/// Paths are relative to the versioned API root, e.g.
/// `deviceAppManagement/mobileApps/{id}`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// `Ok(None)` when the resource does not exist.
    async fn get(&self, session: &SessionContext, resource_path: &str) -> Result<Option<Value>>;

    /// Sends `body` as a JSON partial update; only the transmitted fields change.
    async fn patch(&self, session: &SessionContext, resource_path: &str, body: &Value)
        -> Result<()>;
}
