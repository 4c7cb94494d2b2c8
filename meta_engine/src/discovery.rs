//! Header discovery and content hashing.
//!
//! Walks the configured source roots for C++ headers and computes streaming
//! SHA-256 digests for change detection. Roots are explicit build inputs, so
//! there is no ignore-file handling here — extension filtering only.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Header extensions scanned by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["h", "hpp", "hxx"];

/// Chunk size for streaming file hashing.
const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// Recursively collect header files under each root.
///
/// Missing roots are skipped silently (a build may configure trees that do
/// not exist yet). Paths are canonicalized so the cache keys stay stable
/// regardless of how the roots were spelled, and the result is sorted for
/// deterministic processing order.
#[must_use]
pub fn scan_headers(roots: &[PathBuf], extensions: &[&str]) -> Vec<PathBuf> {
    let mut headers = Vec::new();

    for root in roots {
        if !root.is_dir() {
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Skipping unreadable directory entry: {e}");
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.contains(&ext) {
                continue;
            }

            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            headers.push(canonical);
        }
    }

    headers.sort();
    headers.dedup();
    headers
}

/// Compute the lowercase hex SHA-256 of a file's raw bytes.
///
/// Reads in 8 KiB chunks so large headers never load whole. Returns the
/// empty string when the file cannot be opened or read; the empty string
/// compares unequal to every real digest, which forces a reparse attempt on
/// the next run.
#[must_use]
pub fn hash_file(path: &Path) -> String {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return String::new(),
    };

    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];

    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(_) => return String::new(),
        }
    }

    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
