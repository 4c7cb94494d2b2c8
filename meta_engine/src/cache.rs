//! Content-addressable metadata cache.
//!
//! Stores parsed reflection metadata per file, keyed by canonical path and
//! guarded by a SHA-256 content hash: a file whose current hash matches its
//! cached hash is never re-parsed. The on-disk format is a single JSON file
//! carrying a schema version; a version mismatch or malformed file silently
//! degrades to an empty cache so a run never fails because of stale state.
//!
//! Writes are atomic (temp file + rename). Entries are kept in a `BTreeMap`
//! so every iteration — queries, resolution, serialization — is path-ordered
//! and deterministic.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::{hash_file, scan_headers};
use crate::types::{ClassInfo, EnumInfo, FileMetadata};

/// Cache schema version. Any schema-affecting change (new persisted fields,
/// a different primitive-type set) bumps this and invalidates old caches.
pub const SCHEMA_VERSION: &str = "1.1";

/// Name of the cache file inside `--cache-dir`.
pub const CACHE_FILE_NAME: &str = "metadata_cache.json";

/// The on-disk cache format.
///
/// `files` stays as raw JSON values during load so one undecodable entry can
/// be dropped without rejecting the whole file.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: String,
    generated_at: DateTime<Utc>,
    files: serde_json::Map<String, serde_json::Value>,
}

/// Aggregate cache counters, reported at debug level after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached files.
    pub files: usize,
    /// Total classes across all files.
    pub classes: usize,
    /// Total enums across all files.
    pub enums: usize,
    /// Total reflected fields.
    pub fields: usize,
    /// Total reflected methods.
    pub methods: usize,
    /// Number of factory-base classes.
    pub factory_bases: usize,
}

/// File-keyed store of parsed reflection metadata.
pub struct MetadataCache {
    cache_path: PathBuf,
    files: BTreeMap<String, FileMetadata>,
}

impl MetadataCache {
    /// Create an empty cache backed by the given file path.
    #[must_use]
    pub fn new(cache_path: PathBuf) -> Self {
        Self {
            cache_path,
            files: BTreeMap::new(),
        }
    }

    /// Load the cache from disk.
    ///
    /// Returns `true` when a valid cache with the current schema version was
    /// loaded. A missing file, malformed JSON, or a version mismatch leaves
    /// the cache empty and returns `false`; no error escapes. Individual
    /// entries that fail to decode are dropped with a warning while the rest
    /// of the file is still accepted.
    pub fn load(&mut self) -> bool {
        self.files.clear();

        if !self.cache_path.is_file() {
            return false;
        }

        let content = match std::fs::read_to_string(&self.cache_path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read cache file: {e}");
                return false;
            }
        };

        let cache_file: CacheFile = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Malformed cache file ({e}). Starting fresh.");
                return false;
            }
        };

        if cache_file.version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {SCHEMA_VERSION}). Invalidating.",
                cache_file.version
            );
            return false;
        }

        for (path, value) in cache_file.files {
            match serde_json::from_value::<FileMetadata>(value) {
                Ok(meta) => {
                    self.files.insert(path, meta);
                }
                Err(e) => {
                    log::warn!("Dropping undecodable cache entry for '{path}': {e}");
                }
            }
        }

        true
    }

    /// Write the cache to disk atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the parent directory cannot be created or
    /// the file cannot be written. Unlike load, a save failure is fatal to
    /// the run: a generator whose outputs outrun its cache would re-parse
    /// the world forever.
    pub fn save(&self) -> std::io::Result<()> {
        let mut files = serde_json::Map::new();
        for (path, meta) in &self.files {
            let value = serde_json::to_value(meta).map_err(std::io::Error::other)?;
            files.insert(path.clone(), value);
        }

        let cache_file = CacheFile {
            version: SCHEMA_VERSION.to_owned(),
            generated_at: Utc::now(),
            files,
        };
        let json = serde_json::to_string_pretty(&cache_file).map_err(std::io::Error::other)?;

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let pid = std::process::id();
        let tmp_path = self.cache_path.with_extension(format!("json.tmp.{pid}"));
        std::fs::write(&tmp_path, &json)?;

        if let Err(e) = std::fs::rename(&tmp_path, &self.cache_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        Ok(())
    }

    /// Whether a file needs (re)parsing: no entry, or its stored hash differs
    /// from the current content hash.
    #[must_use]
    pub fn is_outdated(&self, path: &Path) -> bool {
        let key = canonical_key(path);
        match self.files.get(&key) {
            None => true,
            Some(entry) => entry.content_hash != hash_file(path),
        }
    }

    /// Scan the roots for headers and return the outdated subset.
    #[must_use]
    pub fn enumerate_outdated(&self, roots: &[PathBuf], extensions: &[&str]) -> Vec<PathBuf> {
        scan_headers(roots, extensions)
            .into_iter()
            .filter(|p| self.is_outdated(p))
            .collect()
    }

    /// Replace the entry for `path` with freshly parsed metadata.
    ///
    /// The stored hash is the file's content as currently read, so the entry
    /// stays valid until the file changes again.
    pub fn ingest(&mut self, path: &Path, classes: Vec<ClassInfo>, enums: Vec<EnumInfo>) {
        let key = canonical_key(path);
        let meta = FileMetadata {
            path: key.clone(),
            content_hash: hash_file(path),
            last_scanned: Utc::now(),
            classes,
            enums,
        };
        self.files.insert(key, meta);
    }

    /// Remove the entry for a single file, if present.
    pub fn remove(&mut self, path: &Path) {
        self.files.remove(&canonical_key(path));
    }

    /// Drop entries whose path is not in `present`. Returns the number of
    /// entries removed.
    pub fn prune(&mut self, present: &HashSet<String>) -> usize {
        let before = self.files.len();
        self.files.retain(|path, _| present.contains(path));
        before - self.files.len()
    }

    /// All cached file entries, in path order.
    pub fn all_files(&self) -> impl Iterator<Item = &FileMetadata> {
        self.files.values()
    }

    /// All cached classes, in path order then declaration order.
    #[must_use]
    pub fn all_classes(&self) -> Vec<&ClassInfo> {
        self.files.values().flat_map(|f| &f.classes).collect()
    }

    /// All cached enums, in path order then declaration order.
    #[must_use]
    pub fn all_enums(&self) -> Vec<&EnumInfo> {
        self.files.values().flat_map(|f| &f.enums).collect()
    }

    /// Classes cached for one specific file (empty if not cached).
    #[must_use]
    pub fn classes_in(&self, path: &Path) -> &[ClassInfo] {
        self.files
            .get(&canonical_key(path))
            .map_or(&[], |f| f.classes.as_slice())
    }

    /// Enums cached for one specific file (empty if not cached).
    #[must_use]
    pub fn enums_in(&self, path: &Path) -> &[EnumInfo] {
        self.files
            .get(&canonical_key(path))
            .map_or(&[], |f| f.enums.as_slice())
    }

    /// All classes whose registration carried `FACTORY_BASE`.
    #[must_use]
    pub fn factory_bases(&self) -> Vec<&ClassInfo> {
        self.all_classes()
            .into_iter()
            .filter(|c| c.is_factory_base)
            .collect()
    }

    /// All classes whose direct parent has the given simple name.
    #[must_use]
    pub fn derived_of(&self, base_name: &str) -> Vec<&ClassInfo> {
        self.all_classes()
            .into_iter()
            .filter(|c| c.parent_class.as_deref() == Some(base_name))
            .collect()
    }

    /// Aggregate counters over the cache contents.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            files: self.files.len(),
            classes: 0,
            enums: 0,
            fields: 0,
            methods: 0,
            factory_bases: 0,
        };
        for file in self.files.values() {
            stats.classes += file.classes.len();
            stats.enums += file.enums.len();
            for class in &file.classes {
                stats.fields += class.fields.len();
                stats.methods += class.methods.len();
                if class.is_factory_base {
                    stats.factory_bases += 1;
                }
            }
        }
        stats
    }
}

/// Canonical string key for a path: resolved when possible, lexical otherwise
/// (a deleted file can no longer be resolved but must still hit its entry).
#[must_use]
pub fn canonical_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
