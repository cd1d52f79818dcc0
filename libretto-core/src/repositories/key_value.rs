//! Durable key-value capability.

use async_trait::async_trait;

use crate::Error;

/// Narrow contract over the durable key-value namespace.
///
/// Absence is not an error: `get` returns `None` for a missing key and
/// `remove` of a missing key succeeds. Callers that can fall back to a
/// default value own that policy; the repository only reports real storage
/// failures.
#[async_trait]
pub trait KeyValueRepository: Send + Sync + 'static {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove `key` and its value entirely.
    async fn remove(&self, key: &str) -> Result<(), Error>;
}
