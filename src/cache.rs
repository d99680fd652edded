// src/cache.rs

//! File-backed JSON cache with hashed keys.
//!
//! Every raw API response is stored verbatim under `{base}/{prefix}_{key}.json`
//! as a `{request, response}` envelope. Keys are SHA-256 fingerprints of the
//! canonicalized request descriptor, so semantically identical requests land
//! on the same file regardless of parameter ordering. Entries never expire;
//! invalidation means deleting the backing file.
//!
//! The cache is a performance layer, not a correctness dependency: every read
//! failure degrades to a miss and every write failure is logged and swallowed.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Envelope persisted for each cached request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The request descriptor that produced the response.
    pub request: serde_json::Value,

    /// The raw response body, stored as parsed JSON.
    pub response: serde_json::Value,
}

/// File-backed cache rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    base: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `base_dir`, creating the directory if needed.
    ///
    /// Directory creation failure is not fatal; subsequent writes will
    /// fail-soft and reads will miss.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base = base_dir.into();
        if let Err(e) = fs::create_dir_all(&base) {
            log::warn!("Failed to create cache dir {:?}: {}", base, e);
        }
        Self { base }
    }

    /// Derive a stable key from any serializable request descriptor.
    ///
    /// The descriptor is canonicalized through `serde_json::Value`, whose map
    /// type keeps keys sorted, so field ordering in the input never affects
    /// the key. Descriptors that cannot be serialized structurally fall back
    /// to their `Debug` rendering.
    pub fn make_key<T: Serialize + fmt::Debug>(obj: &T) -> String {
        let bytes = match serde_json::to_value(obj) {
            Ok(canonical) => canonical.to_string().into_bytes(),
            Err(_) => format!("{obj:?}").into_bytes(),
        };
        hex::encode(Sha256::digest(&bytes))
    }

    /// Deterministic file path for a namespace prefix and key.
    ///
    /// The prefix keeps unrelated data kinds (listing pages, school pages,
    /// aggregated school results) from colliding in one key space.
    pub fn path_for(&self, prefix: &str, key: &str) -> PathBuf {
        self.base.join(format!("{prefix}_{key}.json"))
    }

    /// Read a cached envelope, treating every failure as a miss.
    pub fn read(&self, path: &Path) -> Option<CacheEntry> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("cache miss: {:?}", path);
                return None;
            }
            Err(e) => {
                log::warn!("cache read failed for {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => {
                log::debug!("cache hit: {:?}", path);
                Some(entry)
            }
            Err(e) => {
                log::warn!("cache entry corrupt at {:?}: {}", path, e);
                None
            }
        }
    }

    /// Persist an envelope, overwriting unconditionally.
    ///
    /// Single-process sequential runs are assumed; there is no locking.
    pub fn write(&self, path: &Path, entry: &CacheEntry) {
        let bytes = match serde_json::to_vec_pretty(entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("cache serialize failed for {:?}: {}", path, e);
                return;
            }
        };
        match fs::write(path, &bytes) {
            Ok(()) => log::debug!("cache write: {:?} ({} bytes)", path, bytes.len()),
            Err(e) => log::warn!("cache write failed for {:?}: {}", path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_key_ignores_field_order() {
        let mut a = serde_json::Map::new();
        a.insert("page".to_string(), json!(1));
        a.insert("location".to_string(), json!("New York"));

        let mut b = serde_json::Map::new();
        b.insert("location".to_string(), json!("New York"));
        b.insert("page".to_string(), json!(1));

        assert_eq!(
            FileCache::make_key(&serde_json::Value::Object(a)),
            FileCache::make_key(&serde_json::Value::Object(b))
        );
    }

    #[test]
    fn test_key_changes_with_any_value() {
        let base = json!({"page": 1, "location": "New York"});
        let page = json!({"page": 2, "location": "New York"});
        let loc = json!({"page": 1, "location": "Albany"});

        let key = FileCache::make_key(&base);
        assert_ne!(key, FileCache::make_key(&page));
        assert_ne!(key, FileCache::make_key(&loc));
    }

    #[test]
    fn test_key_is_type_stable() {
        // "1" the string and 1 the number must not collide.
        assert_ne!(
            FileCache::make_key(&json!({"page": 1})),
            FileCache::make_key(&json!({"page": "1"}))
        );
    }

    #[test]
    fn test_path_prefix_separates_namespaces() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let key = FileCache::make_key(&json!({"lat": 40.8}));
        assert_ne!(cache.path_for("schools", &key), cache.path_for("schools_page", &key));
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());

        let entry = CacheEntry {
            request: json!({"url": "https://example.com", "data": {"page": 1}}),
            response: json!({"items": [1, 2, 3]}),
        };
        let path = cache.path_for("page", "abc123");
        cache.write(&path, &entry);

        let loaded = cache.read(&path).unwrap();
        assert_eq!(loaded.response, entry.response);
        assert_eq!(loaded.request, entry.request);
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        assert!(cache.read(&cache.path_for("page", "nope")).is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let path = cache.path_for("page", "bad");
        fs::write(&path, b"not json {").unwrap();
        assert!(cache.read(&path).is_none());
    }

    #[test]
    fn test_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let path = cache.path_for("page", "x");

        cache.write(
            &path,
            &CacheEntry { request: json!({}), response: json!({"v": 1}) },
        );
        cache.write(
            &path,
            &CacheEntry { request: json!({}), response: json!({"v": 2}) },
        );

        assert_eq!(cache.read(&path).unwrap().response, json!({"v": 2}));
    }
}
