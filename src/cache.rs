//! Cache Facade Adapter
//!
//! Wraps an opaque asynchronous key/value store into a per-asset facade
//! addressed by `(asset name, content hash)`. A hit replays a previously
//! computed obfuscation result plus the registry delta it produced; a miss
//! is filled after a successful transform. Two stores are provided: an
//! in-memory one and a filesystem one keeping one JSON entry per asset.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::compilation::SourceWithMap;
use crate::error::CacheError;
use crate::registry::IdentifierNamesCache;

/// SHA-256 of the asset source, hex encoded.
pub fn content_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Content-derived identity of one asset's current source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset_name: String,
    pub content_hash: String,
}

/// What a cache entry persists: the transformed source and the rename-table
/// delta the transform added on top of the shared registry at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObfuscationCacheData {
    pub source: SourceWithMap,
    pub added_identifier_names_cache: IdentifierNamesCache,
}

/// Opaque asynchronous key/value storage, host-supplied.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    async fn put(&self, key: &CacheKey, value: Vec<u8>) -> Result<(), CacheError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-ASSET FACADE
// ═══════════════════════════════════════════════════════════════════════════════

/// Binds a store to one asset's identity. The content hash is computed on
/// first use, not at construction.
pub struct ItemCacheFacade {
    store: Arc<dyn CacheStore>,
    asset_name: String,
    source_text: String,
    hash: OnceCell<String>,
}

impl ItemCacheFacade {
    pub fn new(
        store: Arc<dyn CacheStore>,
        asset_name: impl Into<String>,
        source_text: impl Into<String>,
    ) -> Self {
        ItemCacheFacade {
            store,
            asset_name: asset_name.into(),
            source_text: source_text.into(),
            hash: OnceCell::new(),
        }
    }

    fn key(&self) -> CacheKey {
        let hash = self.hash.get_or_init(|| content_hash(&self.source_text));
        CacheKey {
            asset_name: self.asset_name.clone(),
            content_hash: hash.clone(),
        }
    }

    pub async fn get(&self) -> Result<Option<ObfuscationCacheData>, CacheError> {
        match self.store.get(&self.key()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn store(&self, data: &ObfuscationCacheData) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(data)?;
        self.store.put(&self.key(), bytes).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        MemoryCacheStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.lock().insert(key.clone(), value);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILESYSTEM STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize, Deserialize)]
struct FsCacheEntry {
    hash: String,
    /// Hex-encoded opaque payload.
    payload: String,
}

/// One JSON entry per asset under a cache directory. A stale or corrupt
/// entry is treated as a miss; corrupt files are removed on sight.
pub struct FsCacheStore {
    cache_dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).ok();
        }
        FsCacheStore { cache_dir }
    }

    fn entry_path(&self, asset_name: &str) -> PathBuf {
        // Stable file name per asset; the content hash lives inside the entry
        let safe_name = asset_name
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let entry_path = self.entry_path(&key.asset_name);
        if !entry_path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&entry_path)?;

        let entry: FsCacheEntry = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    asset = %key.asset_name,
                    error = %err,
                    "invalidating corrupt cache entry"
                );
                fs::remove_file(&entry_path).ok();
                return Ok(None);
            }
        };

        if entry.hash != key.content_hash {
            return Ok(None);
        }

        match hex::decode(&entry.payload) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => {
                tracing::warn!(
                    asset = %key.asset_name,
                    error = %err,
                    "invalidating corrupt cache payload"
                );
                fs::remove_file(&entry_path).ok();
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &CacheKey, value: Vec<u8>) -> Result<(), CacheError> {
        let entry = FsCacheEntry {
            hash: key.content_hash.clone(),
            payload: hex::encode(value),
        };
        let data = serde_json::to_string(&entry)?;
        fs::write(self.entry_path(&key.asset_name), data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> ObfuscationCacheData {
        ObfuscationCacheData {
            source: SourceWithMap {
                source: "var _0x1 = 1;".to_string(),
                map: Some("{}".to_string()),
            },
            added_identifier_names_cache: IdentifierNamesCache {
                global_identifiers: [("foo".to_string(), "_0x1".to_string())]
                    .into_iter()
                    .collect(),
                property_identifiers: HashMap::new(),
            },
        }
    }

    #[test]
    fn test_content_hash_is_stable_and_content_sensitive() {
        assert_eq!(content_hash("var a = 1;"), content_hash("var a = 1;"));
        assert_ne!(content_hash("var a = 1;"), content_hash("var a = 2;"));
        assert_eq!(content_hash("").len(), 64);
    }

    #[tokio::test]
    async fn test_memory_store_round_trip_through_facade() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());

        let facade = ItemCacheFacade::new(Arc::clone(&store), "main.js", "var foo = 1;");
        assert!(facade.get().await.unwrap().is_none());

        facade.store(&sample_data()).await.unwrap();
        assert_eq!(facade.get().await.unwrap(), Some(sample_data()));
    }

    #[tokio::test]
    async fn test_changed_content_misses() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());

        let facade = ItemCacheFacade::new(Arc::clone(&store), "main.js", "var foo = 1;");
        facade.store(&sample_data()).await.unwrap();

        let changed = ItemCacheFacade::new(store, "main.js", "var foo = 2;");
        assert!(changed.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_store_round_trip_and_staleness() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CacheStore> = Arc::new(FsCacheStore::new(dir.path()));

        let facade = ItemCacheFacade::new(Arc::clone(&store), "js/main.js", "var foo = 1;");
        facade.store(&sample_data()).await.unwrap();
        assert_eq!(facade.get().await.unwrap(), Some(sample_data()));

        // New content under the same asset name is a miss
        let changed = ItemCacheFacade::new(store, "js/main.js", "var foo = 2;");
        assert!(changed.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_store_invalidates_corrupt_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path());

        let key = CacheKey {
            asset_name: "main.js".to_string(),
            content_hash: content_hash("var foo = 1;"),
        };
        let entry_path = store.entry_path("main.js");
        fs::write(&entry_path, "not json").unwrap();

        assert!(store.get(&key).await.unwrap().is_none());
        assert!(!entry_path.exists(), "corrupt entry must be removed");
    }
}
