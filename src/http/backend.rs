//! Cache storage backends and the factories that select them.
//!
//! The transaction factory never knows which backend it received; it only
//! sees the [`BackendFactory`] outcome. A profile that disables caching
//! gets [`NoCacheBackendFactory`], whose create call fails deterministically
//! so requests proceed uncached without error.

use crate::base::neterror::NetError;
use bytes::Bytes;
use dashmap::DashMap;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{Duration, OffsetDateTime};
use url::Url;

/// Engine default cache capacity, used when the configured size is 0.
const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Cache key: URL without fragment plus the method.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    url: String,
    method: String,
}

impl CacheKey {
    pub fn new(url: &Url, method: &str) -> Self {
        // Strip fragment for cache key
        let mut url_str = url.to_string();
        if let Some(pos) = url_str.find('#') {
            url_str.truncate(pos);
        }
        Self {
            url: url_str,
            method: method.to_uppercase(),
        }
    }

    fn file_stem(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// Cached response entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// When this entry was cached
    pub cached_at: OffsetDateTime,
    /// Time-to-live (from max-age or Expires)
    pub ttl: Option<Duration>,
    /// ETag for conditional requests
    pub etag: Option<String>,
    /// Last-Modified for conditional requests
    pub last_modified: Option<String>,
}

impl CacheEntry {
    /// Check if the entry is still fresh.
    pub fn is_fresh(&self) -> bool {
        match self.ttl {
            Some(ttl) => OffsetDateTime::now_utc() < self.cached_at + ttl,
            None => false, // No TTL means not cacheable
        }
    }

    /// Check if we should revalidate (entry exists but stale).
    pub fn needs_revalidation(&self) -> bool {
        !self.is_fresh() && (self.etag.is_some() || self.last_modified.is_some())
    }

    fn size(&self) -> usize {
        self.body.len()
    }
}

/// Storage engine seen by the transaction factory.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, NetError>;
    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), NetError>;
    fn remove(&self, key: &CacheKey);
    fn entry_count(&self) -> usize;
}

/// Creates the backend for one context, exactly once.
pub trait BackendFactory: Send + Sync {
    fn create_backend(&self) -> Result<Box<dyn CacheBackend>, NetError>;
}

/// Factory whose create call always fails; requests bypass caching.
#[derive(Debug, Default)]
pub struct NoCacheBackendFactory;

impl BackendFactory for NoCacheBackendFactory {
    fn create_backend(&self) -> Result<Box<dyn CacheBackend>, NetError> {
        Err(NetError::CacheCreateFailure)
    }
}

/// In-memory backend for in-memory profiles.
pub struct InMemoryBackendFactory {
    max_bytes: usize,
}

impl InMemoryBackendFactory {
    /// `max_bytes` of 0 selects the engine default.
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl BackendFactory for InMemoryBackendFactory {
    fn create_backend(&self) -> Result<Box<dyn CacheBackend>, NetError> {
        Ok(Box::new(InMemoryBackend::new(self.max_bytes)))
    }
}

/// Disk-backed backend rooted at a profile's cache directory.
pub struct DiskBackendFactory {
    path: PathBuf,
    max_bytes: usize,
}

impl DiskBackendFactory {
    /// `max_bytes` of 0 selects the engine default.
    pub fn new(path: PathBuf, max_bytes: usize) -> Self {
        Self { path, max_bytes }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl BackendFactory for DiskBackendFactory {
    fn create_backend(&self) -> Result<Box<dyn CacheBackend>, NetError> {
        std::fs::create_dir_all(&self.path).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "cache dir creation failed");
            NetError::CacheCreateFailure
        })?;
        Ok(Box::new(DiskBackend::new(self.path.clone(), self.max_bytes)))
    }
}

/// In-memory store with size- and count-based eviction.
pub struct InMemoryBackend {
    entries: DashMap<CacheKey, CacheEntry>,
    current_size: AtomicUsize,
    max_bytes: usize,
    max_entries: usize,
}

impl InMemoryBackend {
    fn new(max_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            current_size: AtomicUsize::new(0),
            max_bytes: if max_bytes == 0 {
                DEFAULT_MAX_BYTES
            } else {
                max_bytes
            },
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().cached_at)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.remove(&key);
        }
    }
}

impl CacheBackend for InMemoryBackend {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, NetError> {
        Ok(self.entries.get(key).map(|e| e.clone()))
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), NetError> {
        if entry.size() > self.max_bytes {
            return Ok(()); // never worth evicting the world for one entry
        }

        while self.entries.len() >= self.max_entries
            || self.current_size.load(Ordering::Relaxed) + entry.size() > self.max_bytes
        {
            if self.entries.is_empty() {
                break;
            }
            self.evict_oldest();
        }

        if let Some(old) = self.entries.insert(key, entry.clone()) {
            self.current_size.fetch_sub(old.size(), Ordering::Relaxed);
        }
        self.current_size.fetch_add(entry.size(), Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) {
        if let Some((_, old)) = self.entries.remove(key) {
            self.current_size.fetch_sub(old.size(), Ordering::Relaxed);
        }
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Serialized form of one disk entry.
#[derive(Serialize, Deserialize)]
struct DiskEntry {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    cached_at_unix: i64,
    ttl_secs: Option<u64>,
    etag: Option<String>,
    last_modified: Option<String>,
}

impl DiskEntry {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            status: entry.status.as_u16(),
            headers: entry
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
                })
                .collect(),
            body: entry.body.to_vec(),
            cached_at_unix: entry.cached_at.unix_timestamp(),
            ttl_secs: entry.ttl.map(|d| d.whole_seconds().max(0) as u64),
            etag: entry.etag.clone(),
            last_modified: entry.last_modified.clone(),
        }
    }

    fn into_entry(self) -> Option<CacheEntry> {
        let status = StatusCode::from_u16(self.status).ok()?;
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(&value),
            ) {
                headers.insert(name, value);
            }
        }
        Some(CacheEntry {
            status,
            headers,
            body: Bytes::from(self.body),
            cached_at: OffsetDateTime::from_unix_timestamp(self.cached_at_unix).ok()?,
            ttl: self.ttl_secs.map(|s| Duration::seconds(s as i64)),
            etag: self.etag,
            last_modified: self.last_modified,
        })
    }
}

/// One file per entry under the cache directory.
pub struct DiskBackend {
    path: PathBuf,
    max_bytes: usize,
    entry_count: AtomicUsize,
}

impl DiskBackend {
    fn new(path: PathBuf, max_bytes: usize) -> Self {
        let existing = std::fs::read_dir(&path)
            .map(|dir| dir.filter_map(Result::ok).count())
            .unwrap_or(0);
        Self {
            path,
            max_bytes: if max_bytes == 0 {
                DEFAULT_MAX_BYTES
            } else {
                max_bytes
            },
            entry_count: AtomicUsize::new(existing),
        }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.path.join(key.file_stem())
    }
}

impl CacheBackend for DiskBackend {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, NetError> {
        let path = self.entry_path(key);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cache read failed");
                return Err(NetError::CacheReadFailure);
            }
        };

        match serde_json::from_slice::<DiskEntry>(&data).ok().and_then(DiskEntry::into_entry) {
            Some(entry) => Ok(Some(entry)),
            None => {
                // Corrupt entry: drop it and report a miss.
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), NetError> {
        if entry.size() > self.max_bytes {
            return Ok(());
        }
        let serialized = serde_json::to_vec(&DiskEntry::from_entry(&entry))
            .map_err(|_| NetError::CacheWriteFailure)?;
        let path = self.entry_path(&key);
        std::fs::write(&path, serialized).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "cache write failed");
            NetError::CacheWriteFailure
        })?;
        self.entry_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) {
        if std::fs::remove_file(self.entry_path(key)).is_ok() {
            self.entry_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    fn entry_count(&self) -> usize {
        self.entry_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(body: &str, ttl_secs: i64) -> CacheEntry {
        CacheEntry {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
            cached_at: OffsetDateTime::now_utc(),
            ttl: Some(Duration::seconds(ttl_secs)),
            etag: None,
            last_modified: None,
        }
    }

    fn key(url: &str) -> CacheKey {
        CacheKey::new(&Url::parse(url).unwrap(), "GET")
    }

    #[test]
    fn test_no_cache_factory_always_fails() {
        let factory = NoCacheBackendFactory;
        for _ in 0..3 {
            assert_eq!(
                factory.create_backend().err().unwrap(),
                NetError::CacheCreateFailure
            );
        }
    }

    #[test]
    fn test_in_memory_roundtrip() {
        let backend = InMemoryBackendFactory::new(0).create_backend().unwrap();
        let k = key("https://example.com/page");
        backend.put(k.clone(), entry("hello", 60)).unwrap();

        let got = backend.get(&k).unwrap().unwrap();
        assert_eq!(&got.body[..], b"hello");
        assert!(got.is_fresh());
        assert_eq!(backend.entry_count(), 1);

        backend.remove(&k);
        assert!(backend.get(&k).unwrap().is_none());
    }

    #[test]
    fn test_fragment_stripped_from_key() {
        assert_eq!(
            key("https://example.com/page#frag"),
            key("https://example.com/page")
        );
    }

    #[test]
    fn test_stale_entry_needs_revalidation() {
        let mut e = entry("x", 60);
        e.cached_at = OffsetDateTime::now_utc() - Duration::hours(1);
        e.etag = Some("\"abc\"".to_string());
        assert!(!e.is_fresh());
        assert!(e.needs_revalidation());
    }

    #[test]
    fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskBackendFactory::new(dir.path().join("Cache"), 0);
        let backend = factory.create_backend().unwrap();

        let k = key("https://example.com/resource");
        backend.put(k.clone(), entry("disk body", 120)).unwrap();

        // A fresh backend over the same directory sees the entry.
        let backend2 = factory.create_backend().unwrap();
        let got = backend2.get(&k).unwrap().unwrap();
        assert_eq!(&got.body[..], b"disk body");
        assert_eq!(got.status, StatusCode::OK);
    }

    #[test]
    fn test_disk_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskBackendFactory::new(dir.path().join("Cache"), 0);
        let backend = factory.create_backend().unwrap();

        let k = key("https://example.com/bad");
        backend.put(k.clone(), entry("x", 60)).unwrap();
        // Corrupt the file behind the backend's back.
        let file = std::fs::read_dir(dir.path().join("Cache"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        std::fs::write(&file, b"not json").unwrap();

        assert!(backend.get(&k).unwrap().is_none());
    }

    #[test]
    fn test_in_memory_entry_larger_than_cache_skipped() {
        let backend = InMemoryBackendFactory::new(4).create_backend().unwrap();
        let k = key("https://example.com/huge");
        backend.put(k.clone(), entry("way too big", 60)).unwrap();
        assert!(backend.get(&k).unwrap().is_none());
    }
}
