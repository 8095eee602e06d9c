pub mod memory;

#[cfg(feature = "file-backend")]
pub mod file;

#[cfg(feature = "dynamodb-backend")]
pub mod dynamo;

use async_trait::async_trait;

use crate::error::StoreError;

/// String-keyed value store holding all per-conversation state.
///
/// Implementations are the single durable owner of configuration and
/// transcript records; the pipeline keeps only request-scoped copies.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
