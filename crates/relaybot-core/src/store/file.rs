use std::path::PathBuf;

use async_trait::async_trait;

use super::KvStore;
use crate::error::StoreError;
use crate::util::safe_filename;

/// File-based store, one file per key.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Self {
        std::fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(safe_filename(key))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read(e.to_string())),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Delete(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(tmp.path().join("data"));

        store.put("history:100", r#"[{"role":"system","content":"hi"}]"#)
            .await
            .unwrap();
        let value = store.get("history:100").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"[{"role":"system","content":"hi"}]"#));
    }

    #[tokio::test]
    async fn test_file_store_absent_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(tmp.path().join("data"));
        assert_eq!(store.get("history:999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(tmp.path().join("data"));

        store.put("user_config:100", "{}").await.unwrap();
        store.delete("user_config:100").await.unwrap();
        assert_eq!(store.get("user_config:100").await.unwrap(), None);

        // deleting again is not an error
        store.delete("user_config:100").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_distinct_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(tmp.path().join("data"));

        store.put("history:100", "a").await.unwrap();
        store.put("user_config:100", "b").await.unwrap();
        assert_eq!(store.get("history:100").await.unwrap().as_deref(), Some("a"));
        assert_eq!(
            store.get("user_config:100").await.unwrap().as_deref(),
            Some("b")
        );
    }
}
