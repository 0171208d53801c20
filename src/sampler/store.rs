// Sample store - Content store for audio blobs referenced by `db_key`
//
// Projects never embed audio; they hold a key into a store. `MemoryStore`
// keeps blobs in a map, `DirStore` keeps one file per key in a directory.

use super::loader::SampleError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key/blob store for sample audio
pub trait SampleStore {
    /// Fetch a blob, None on a miss
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a blob under `key`, returning the key
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<String, SampleError>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Generate a fresh store key
pub fn new_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.blobs.remove(key)
    }
}

impl SampleStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.get(key).cloned()
    }

    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<String, SampleError> {
        self.blobs.insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }
}

/// Directory-backed store, one `<key>.bin` file per blob
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, SampleError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keep keys inside the store directory
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{}.bin", file_name))
    }
}

impl SampleStore for DirStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.path_for(key)).ok()
    }

    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<String, SampleError> {
        fs::write(self.path_for(key), bytes)?;
        Ok(key.to_string())
    }

    fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let key = store.put("kick", vec![1, 2, 3]).unwrap();
        assert_eq!(key, "kick");
        assert_eq!(store.get("kick"), Some(vec![1, 2, 3]));
        assert_eq!(store.get("snare"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_dir_store_persists_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DirStore::open(temp_dir.path().join("samples")).unwrap();

        let key = new_key();
        store.put(&key, vec![9; 16]).unwrap();
        assert!(store.contains(&key));

        let reopened = DirStore::open(temp_dir.path().join("samples")).unwrap();
        assert_eq!(reopened.get(&key), Some(vec![9; 16]));
        assert_eq!(reopened.get("missing"), None);
    }

    #[test]
    fn test_dir_store_sanitizes_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DirStore::open(temp_dir.path()).unwrap();
        store.put("../escape", vec![1]).unwrap();
        assert!(temp_dir.path().join("___escape.bin").is_file());
    }
}
