use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use async_trait::async_trait;

use super::KvStore;
use crate::error::StoreError;

/// DynamoDB-based store: one item per key, partition key `k`, value in `v`,
/// numeric `ttl` thirty days out refreshed on every write.
pub struct DynamoKvStore {
    client: Client,
    table_name: String,
}

impl DynamoKvStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl KvStore for DynamoKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("k", AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        Ok(output
            .item()
            .and_then(|item| item.get("v").and_then(|v| v.as_s().ok()).cloned()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let ttl = (chrono::Utc::now().timestamp() + 30 * 24 * 3600).to_string();
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item("k", AttributeValue::S(key.to_string()))
            .item("v", AttributeValue::S(value.to_string()))
            .item("ttl", AttributeValue::N(ttl))
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("k", AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Delete(e.to_string()))?;
        Ok(())
    }
}
