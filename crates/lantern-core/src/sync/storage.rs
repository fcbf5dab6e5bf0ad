//! Pluggable blob storage for trusted sync-committee state.
//!
//! Keys are ASCII strings of the form `states_<chain_id>` and
//! `sync_<chain_id>_<period>`; values are opaque blobs owned by the plugin.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Contract the sync-committee store delegates its persistence to.
pub trait Storage: Send + Sync {
    /// Get data for a key.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Set data for a key.
    fn set(&self, key: &str, value: &[u8]);

    /// Delete data for a key.
    fn delete(&self, key: &str);
}

/// In-memory storage implementation.
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
    }

    fn delete(&self, key: &str) {
        self.data.lock().unwrap().remove(key);
    }
}

/// File-based storage implementation, one file per key.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_dir`, the `LANTERN_STATES_DIR`
    /// environment variable, or a temp directory, in that order.
    pub fn new(base_dir: Option<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.unwrap_or_else(|| {
            env::var("LANTERN_STATES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("lantern_states"))
        });
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // keys are ASCII identifiers; keep the path filesystem-safe anyway
        let safe: String = key
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
            .collect();
        let safe = if safe.is_empty() { "empty".to_string() } else { safe };
        self.base_dir.join(format!("{safe}.dat"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.file_path(key)).ok()
    }

    fn set(&self, key: &str, value: &[u8]) {
        let _ = fs::write(self.file_path(key), value);
    }

    fn delete(&self, key: &str) {
        let _ = fs::remove_file(self.file_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set("key1", b"value1");
        assert_eq!(storage.get("key1"), Some(b"value1".to_vec()));

        storage.set("key1", b"value2");
        assert_eq!(storage.get("key1"), Some(b"value2".to_vec()));

        storage.delete("key1");
        assert_eq!(storage.get("key1"), None);
    }

    #[test]
    fn test_file_storage() {
        let dir = env::temp_dir().join("lantern_test_storage");
        let _ = fs::remove_dir_all(&dir);
        let storage = FileStorage::new(Some(dir.clone())).unwrap();

        storage.set("sync_1_123", b"blob");
        assert_eq!(storage.get("sync_1_123"), Some(b"blob".to_vec()));
        storage.delete("sync_1_123");
        assert_eq!(storage.get("sync_1_123"), None);

        let _ = fs::remove_dir_all(&dir);
    }
}
