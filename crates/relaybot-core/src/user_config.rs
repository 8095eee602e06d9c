use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{StoreError, UserConfigError};
use crate::store::KvStore;

/// Key of the system-prompt field, as stored and as accepted by `SETENV`.
pub const SYSTEM_INIT_MESSAGE: &str = "SYSTEM_INIT_MESSAGE";
/// Key of the extra-parameters field, as stored and as accepted by `SETENV`.
pub const OPENAI_API_EXTRA_PARAMS: &str = "OPENAI_API_EXTRA_PARAMS";

/// System prompt used until a conversation overrides it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Per-conversation configuration, persisted under `user_config:<id>`.
/// The stored JSON carries the upper-case field names verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    #[serde(rename = "SYSTEM_INIT_MESSAGE")]
    pub system_init_message: String,
    #[serde(rename = "OPENAI_API_EXTRA_PARAMS")]
    pub openai_api_extra_params: Map<String, Value>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            system_init_message: DEFAULT_SYSTEM_PROMPT.to_string(),
            openai_api_extra_params: Map::new(),
        }
    }
}

impl UserConfig {
    /// Apply one `SETENV` update. Unknown keys and type-invalid values are
    /// rejected without mutating anything.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), UserConfigError> {
        match key {
            SYSTEM_INIT_MESSAGE => {
                self.system_init_message = value.to_string();
                Ok(())
            }
            OPENAI_API_EXTRA_PARAMS => match serde_json::from_str::<Value>(value) {
                Ok(Value::Object(params)) => {
                    self.openai_api_extra_params = params;
                    Ok(())
                }
                _ => Err(UserConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "expected a JSON object".to_string(),
                }),
            },
            _ => Err(UserConfigError::UnknownKey(key.to_string())),
        }
    }

    /// Merge a stored record into the defaults, field by field. The record
    /// comes from external storage and is not trusted: unknown fields and
    /// type-mismatched values are dropped with a log line.
    fn merge_untrusted(&mut self, raw: &Value) {
        let Some(fields) = raw.as_object() else {
            warn!("Stored configuration is not a JSON object, using defaults");
            return;
        };
        for (key, value) in fields {
            match key.as_str() {
                SYSTEM_INIT_MESSAGE => match value.as_str() {
                    Some(s) => self.system_init_message = s.to_string(),
                    None => warn!("Discarding non-string {}", SYSTEM_INIT_MESSAGE),
                },
                OPENAI_API_EXTRA_PARAMS => match value.as_object() {
                    Some(params) => self.openai_api_extra_params = params.clone(),
                    None => warn!("Discarding non-object {}", OPENAI_API_EXTRA_PARAMS),
                },
                other => debug!("Ignoring unknown configuration field {}", other),
            }
        }
    }
}

/// Store key for a conversation's configuration record.
pub fn config_key(conversation_id: &str) -> String {
    format!("user_config:{}", conversation_id)
}

/// Load the configuration for a conversation. Absent, unreadable, or
/// malformed records fall back to defaults; this never fails outward.
pub async fn load(store: &dyn KvStore, conversation_id: &str) -> UserConfig {
    let mut config = UserConfig::default();
    match store.get(&config_key(conversation_id)).await {
        Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => config.merge_untrusted(&value),
            Err(e) => warn!(
                "Ignoring malformed configuration for {}: {}",
                conversation_id, e
            ),
        },
        Ok(None) => {}
        Err(e) => warn!(
            "Failed to load configuration for {}: {}",
            conversation_id, e
        ),
    }
    config
}

/// Persist the full configuration record for a conversation.
pub async fn persist(
    store: &dyn KvStore,
    conversation_id: &str,
    config: &UserConfig,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(config).map_err(|e| StoreError::Write(e.to_string()))?;
    store.put(&config_key(conversation_id), &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryKvStore;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl KvStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Read("backend down".to_string()))
        }
        async fn put(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("backend down".to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Delete("backend down".to_string()))
        }
    }

    #[test]
    fn test_defaults() {
        let config = UserConfig::default();
        assert_eq!(config.system_init_message, "You are a helpful assistant.");
        assert!(config.openai_api_extra_params.is_empty());
    }

    #[test]
    fn test_set_system_message() {
        let mut config = UserConfig::default();
        config.set(SYSTEM_INIT_MESSAGE, "Be terse").unwrap();
        assert_eq!(config.system_init_message, "Be terse");
    }

    #[test]
    fn test_set_extra_params() {
        let mut config = UserConfig::default();
        config
            .set(OPENAI_API_EXTRA_PARAMS, r#"{"temperature": 0.2}"#)
            .unwrap();
        assert_eq!(
            config.openai_api_extra_params.get("temperature"),
            Some(&serde_json::json!(0.2))
        );
    }

    #[test]
    fn test_set_extra_params_rejects_non_object() {
        let mut config = UserConfig::default();
        let err = config.set(OPENAI_API_EXTRA_PARAMS, "not json").unwrap_err();
        assert!(matches!(err, UserConfigError::InvalidValue { .. }));
        assert!(config.openai_api_extra_params.is_empty());
    }

    #[test]
    fn test_set_unknown_key() {
        let mut config = UserConfig::default();
        let err = config.set("NOT_A_KEY", "whatever").unwrap_err();
        assert!(matches!(err, UserConfigError::UnknownKey(_)));
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_stored_field_names() {
        let config = UserConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"SYSTEM_INIT_MESSAGE\""));
        assert!(json.contains("\"OPENAI_API_EXTRA_PARAMS\""));
    }

    #[tokio::test]
    async fn test_load_persist_roundtrip() {
        let store = MemoryKvStore::new();
        let mut config = UserConfig::default();
        config.set(SYSTEM_INIT_MESSAGE, "Be terse").unwrap();

        persist(&store, "100", &config).await.unwrap();
        let loaded = load(&store, "100").await;
        assert_eq!(loaded, config);
        assert!(store.get("user_config:100").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_absent_gives_defaults() {
        let store = MemoryKvStore::new();
        assert_eq!(load(&store, "100").await, UserConfig::default());
    }

    #[tokio::test]
    async fn test_load_malformed_gives_defaults() {
        let store = MemoryKvStore::new();
        store.put("user_config:100", "{{{not json").await.unwrap();
        assert_eq!(load(&store, "100").await, UserConfig::default());
    }

    #[tokio::test]
    async fn test_load_merges_field_by_field() {
        let store = MemoryKvStore::new();
        // system message has the wrong type, extra params are valid
        store
            .put(
                "user_config:100",
                r#"{"SYSTEM_INIT_MESSAGE": 42, "OPENAI_API_EXTRA_PARAMS": {"top_p": 1}, "mystery": true}"#,
            )
            .await
            .unwrap();

        let loaded = load(&store, "100").await;
        assert_eq!(loaded.system_init_message, "You are a helpful assistant.");
        assert_eq!(
            loaded.openai_api_extra_params.get("top_p"),
            Some(&serde_json::json!(1))
        );
    }

    #[tokio::test]
    async fn test_load_store_failure_gives_defaults() {
        assert_eq!(load(&FailingStore, "100").await, UserConfig::default());
    }
}
