//! Filesystem fragment cache
//!
//! One file per fingerprint, `<cache_dir>/<fingerprint>.html`, holding the raw
//! rendered fragment. Blocks a view captured while it rendered are kept next
//! to it in `<fingerprint>.blocks.json` and live and die with the fragment.
//! The fragment's modification time is the only expiration signal. There is no locking: concurrent writers race and the last one
//! wins. Every IO fault is logged and reported as a miss.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// What kind of fragment an entry holds; selects its expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// A view or block fragment
    View,
    /// A rendered layout
    Layout,
}

/// Expiration per category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheExpiry {
    /// Lifetime of view fragments
    pub view: Duration,
    /// Lifetime of layout fragments
    pub layout: Duration,
}

impl CacheExpiry {
    /// Lifetime for a category
    pub fn for_category(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::View => self.view,
            CacheCategory::Layout => self.layout,
        }
    }
}

impl Default for CacheExpiry {
    fn default() -> Self {
        Self {
            view: Duration::from_secs(900),
            layout: Duration::from_secs(3600),
        }
    }
}

/// Cache key derived from a logical name and the request path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// SHA-256 of `name` followed by `uri`, hex encoded
    pub fn derive(name: &str, uri: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(uri.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped handle on the fragment cache directory.
///
/// The first `is_cached` answer for a fingerprint is memoized for the rest of
/// the request, so repeated checks never touch the filesystem again.
#[derive(Debug, Clone)]
pub struct FragmentCache {
    dir: PathBuf,
    expiry: CacheExpiry,
    memo: HashMap<Fingerprint, bool>,
}

impl FragmentCache {
    /// Create a cache over `dir`
    pub fn new(dir: impl Into<PathBuf>, expiry: CacheExpiry) -> Self {
        Self {
            dir: dir.into(),
            expiry,
            memo: HashMap::new(),
        }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing an entry
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.html", fingerprint))
    }

    /// File holding the blocks captured by an entry
    pub fn captures_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.blocks.json", fingerprint))
    }

    /// Whether a valid entry exists; expired entries are deleted
    pub fn is_cached(&mut self, fingerprint: &Fingerprint, category: CacheCategory) -> bool {
        self.is_cached_at(fingerprint, category, SystemTime::now())
    }

    pub(crate) fn is_cached_at(
        &mut self,
        fingerprint: &Fingerprint,
        category: CacheCategory,
        now: SystemTime,
    ) -> bool {
        if let Some(&known) = self.memo.get(fingerprint) {
            return known;
        }

        let valid = self.check_entry(fingerprint, category, now);
        self.memo.insert(fingerprint.clone(), valid);
        valid
    }

    fn check_entry(
        &self,
        fingerprint: &Fingerprint,
        category: CacheCategory,
        now: SystemTime,
    ) -> bool {
        let path = self.entry_path(fingerprint);

        let mtime = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to stat cache entry");
                return false;
            }
        };

        // An mtime in the future counts as freshly written
        let age = now.duration_since(mtime).unwrap_or(Duration::ZERO);
        if age >= self.expiry.for_category(category) {
            tracing::debug!(path = %path.display(), ?category, "Cache entry expired");
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Unable to remove expired cache entry");
            }
            self.remove_captures(fingerprint);
            return false;
        }

        true
    }

    /// Read an entry; `None` when it cannot be read
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<String> {
        let path = self.entry_path(fingerprint);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to read cache entry");
                None
            }
        }
    }

    /// Write an entry unconditionally. Failures are logged and ignored.
    pub fn put(&self, fingerprint: &Fingerprint, content: &str) {
        if content.is_empty() {
            return;
        }

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "Unable to create cache directory");
            return;
        }

        let path = self.entry_path(fingerprint);
        if let Err(e) = std::fs::write(&path, content) {
            tracing::warn!(path = %path.display(), error = %e, "Unable to write cache entry");
        }
    }

    /// Blocks captured by an entry; empty when there are none or they cannot
    /// be read
    pub fn get_captures(&self, fingerprint: &Fingerprint) -> HashMap<String, String> {
        let path = self.captures_path(fingerprint);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to read cached blocks");
                return HashMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Malformed cached blocks");
            HashMap::new()
        })
    }

    /// Store the blocks an entry captured, replacing earlier ones. An empty
    /// set removes the file.
    pub fn put_captures(&self, fingerprint: &Fingerprint, captures: &HashMap<String, String>) {
        if captures.is_empty() {
            self.remove_captures(fingerprint);
            return;
        }

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "Unable to create cache directory");
            return;
        }

        let path = self.captures_path(fingerprint);
        let written = serde_json::to_string(captures)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(&path, json));
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), error = %e, "Unable to write cached blocks");
        }
    }

    fn remove_captures(&self, fingerprint: &Fingerprint) {
        let path = self.captures_path(fingerprint);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to remove cached blocks");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn cache(dir: &TempDir) -> FragmentCache {
        FragmentCache::new(
            dir.path(),
            CacheExpiry {
                view: Duration::from_secs(900),
                layout: Duration::from_secs(3600),
            },
        )
    }

    fn mtime(cache: &FragmentCache, fp: &Fingerprint) -> SystemTime {
        std::fs::metadata(cache.entry_path(fp))
            .unwrap()
            .modified()
            .unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let fp = Fingerprint::derive("blog/show", "/blog/42");

        cache.put(&fp, "X");
        assert_eq!(cache.get(&fp).as_deref(), Some("X"));
        assert!(cache.entry_path(&fp).ends_with(format!("{}.html", fp)));
    }

    #[test]
    fn test_missing_entry() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache(&dir);
        let fp = Fingerprint::derive("blog/show", "/blog/42");

        assert!(!cache.is_cached(&fp, CacheCategory::View));
        assert_eq!(cache.get(&fp), None);
    }

    #[test]
    fn test_expired_entry_removed() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache(&dir);
        let fp = Fingerprint::derive("blog/show", "/blog/42");
        cache.put(&fp, "stale");

        let now = mtime(&cache, &fp) + Duration::from_secs(901);
        assert!(!cache.is_cached_at(&fp, CacheCategory::View, now));
        assert!(!cache.entry_path(&fp).exists());
    }

    #[test]
    fn test_fresh_entry_kept() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache(&dir);
        let fp = Fingerprint::derive("blog/show", "/blog/42");
        cache.put(&fp, "fresh");

        let now = mtime(&cache, &fp) + Duration::from_secs(899);
        assert!(cache.is_cached_at(&fp, CacheCategory::View, now));
        assert!(cache.entry_path(&fp).exists());
    }

    #[test]
    fn test_layout_category_uses_layout_expiry() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache(&dir);
        let fp = Fingerprint::derive("layouts/application", "/");
        cache.put(&fp, "<html>{yield}</html>");

        // past the view expiry, within the layout expiry
        let now = mtime(&cache, &fp) + Duration::from_secs(1800);
        assert!(cache.is_cached_at(&fp, CacheCategory::Layout, now));
    }

    #[test]
    fn test_memoized_within_request() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache(&dir);
        let fp = Fingerprint::derive("home", "/");
        cache.put(&fp, "home");

        assert!(cache.is_cached(&fp, CacheCategory::View));
        // the file disappearing is not noticed: no second stat
        std::fs::remove_file(cache.entry_path(&fp)).unwrap();
        assert!(cache.is_cached(&fp, CacheCategory::View));

        let other = Fingerprint::derive("missing", "/");
        assert!(!cache.is_cached(&other, CacheCategory::View));
        cache.put(&other, "now present");
        assert!(!cache.is_cached(&other, CacheCategory::View));
    }

    #[test]
    fn test_put_creates_directory() {
        let dir = TempDir::new().unwrap();
        let cache = FragmentCache::new(dir.path().join("nested/cache"), CacheExpiry::default());
        let fp = Fingerprint::derive("home", "/");
        cache.put(&fp, "home");
        assert_eq!(cache.get(&fp).as_deref(), Some("home"));
    }

    #[test]
    fn test_empty_content_not_written() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let fp = Fingerprint::derive("home", "/");
        cache.put(&fp, "");
        assert!(!cache.entry_path(&fp).exists());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_fingerprint_varies_by_uri(
            name in "[a-z/]{1,20}",
            uri_a in "/[a-z0-9/]{0,20}",
            uri_b in "/[a-z0-9/]{0,20}",
        ) {
            let a = Fingerprint::derive(&name, &uri_a);
            let b = Fingerprint::derive(&name, &uri_b);
            prop_assert_eq!(a.as_str().len(), 64);
            prop_assert_eq!(a == b, uri_a == uri_b);
            prop_assert_eq!(a.clone(), Fingerprint::derive(&name, &uri_a));
        }
    }

    #[test]
    fn test_captures_follow_entry() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache(&dir);
        let fp = Fingerprint::derive("blog/show", "/blog/42");
        let captures = HashMap::from([("title".to_string(), "Post 42".to_string())]);

        cache.put(&fp, "<h1>body</h1>");
        cache.put_captures(&fp, &captures);
        assert_eq!(cache.get_captures(&fp), captures);

        let now = mtime(&cache, &fp) + Duration::from_secs(901);
        assert!(!cache.is_cached_at(&fp, CacheCategory::View, now));
        assert!(!cache.captures_path(&fp).exists());
        assert!(cache.get_captures(&fp).is_empty());
    }

    #[test]
    fn test_empty_captures_clear_stale_file() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let fp = Fingerprint::derive("blog/show", "/");
        cache.put_captures(&fp, &HashMap::from([("a".to_string(), "b".to_string())]));
        assert!(cache.captures_path(&fp).exists());

        cache.put_captures(&fp, &HashMap::new());
        assert!(!cache.captures_path(&fp).exists());
    }
}
