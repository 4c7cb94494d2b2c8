//! Generation driver: one full pass over the configured trees.
//!
//! Orchestrates discovery → cache load → parse outdated → prune → resolve →
//! render → cache save. The pass is single-threaded and synchronous: the run
//! is short-lived, callers (build systems) parallelize at the target level,
//! and keeping one thread means no shared mutable state anywhere.
//!
//! Per-file failures (unreadable header, no syntax tree, unwritable output)
//! are reported to stderr, counted, and skipped; the previous cache entry for
//! a failed file survives, so the next run retries it. Configuration failures
//! (grammar unavailable, bad settings, broken templates) and a cache-write
//! failure abort the run.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::cache::{canonical_key, MetadataCache, CACHE_FILE_NAME};
use crate::cli::Arguments;
use crate::discovery::{scan_headers, DEFAULT_EXTENSIONS};
use crate::parser::{CppParser, ParserUnavailable};
use crate::render::{RenderError, Renderer};
use crate::resolver::resolve_families;
use crate::settings::{Settings, SettingsError};

/// Options for one generation pass.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Header roots that are scanned and (re)parsed.
    pub source_dirs: Vec<PathBuf>,
    /// Destination for generated headers.
    pub output_dir: PathBuf,
    /// Directory holding the metadata cache file.
    pub cache_dir: PathBuf,
    /// Include roots for computing generated include paths.
    pub include_dirs: Vec<PathBuf>,
    /// Extra roots scanned for derived classes.
    pub scan_dirs: Vec<PathBuf>,
    /// Optional settings file.
    pub settings: Option<PathBuf>,
    /// Project-root namespace for name scoping.
    pub project_namespace: String,
    /// Treat every discovered file as outdated.
    pub force: bool,
}

impl From<&Arguments> for RunOptions {
    fn from(args: &Arguments) -> Self {
        Self {
            source_dirs: args.source_dirs.clone(),
            output_dir: args.output_dir.clone(),
            cache_dir: args.cache_dir.clone(),
            include_dirs: args.include_dirs.clone(),
            scan_dirs: args.scan_dirs.clone(),
            settings: args.settings.clone(),
            project_namespace: args.project_namespace.clone(),
            force: args.force,
        }
    }
}

/// Counters reported after a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files parsed (and ingested) this run.
    pub parsed: usize,
    /// Generated headers written this run.
    pub generated: usize,
    /// Per-file errors (parse or render); non-zero fails the run.
    pub errors: usize,
    /// Cache entries removed for files no longer on disk.
    pub pruned: usize,
}

/// A failure that aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// The native C++ syntax capability could not be bootstrapped.
    #[error("{0}")]
    Parser(#[from] ParserUnavailable),

    /// The settings file could not be loaded.
    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// The embedded templates failed to compile.
    #[error("{0}")]
    Renderer(#[from] RenderError),

    /// The cache file could not be written.
    #[error("Failed to save metadata cache: {0}")]
    CacheWrite(std::io::Error),
}

/// Run one full generation pass.
///
/// # Errors
///
/// Returns [`FatalError`] for configuration failures and cache-write
/// failures. Per-file errors do not abort the pass; they are counted in the
/// returned [`RunSummary`] and the caller maps a non-zero count to a
/// non-zero exit code.
pub fn run(options: &RunOptions) -> Result<RunSummary, FatalError> {
    // Settings are optional; a present-but-broken file is a hard failure.
    if let Some(settings_path) = &options.settings {
        let settings = Settings::load(settings_path)?;
        if let Some(llvm_bin_path) = settings.llvm_bin_path {
            log::debug!("Settings llvm_bin_path: {llvm_bin_path} (grammar is built in)");
        }
    }

    let mut parser = CppParser::new(&options.project_namespace)?;
    let renderer = Renderer::new(options.output_dir.clone(), &options.project_namespace)?;

    let cache_path = options.cache_dir.join(CACHE_FILE_NAME);
    let mut cache = MetadataCache::new(cache_path);
    if cache.load() {
        let stats = cache.stats();
        log::debug!(
            "Loaded cache: {} files, {} classes",
            stats.files,
            stats.classes
        );
    } else {
        log::debug!("No usable cache, starting fresh");
    }

    let mut summary = RunSummary::default();
    let mut newly_ingested: Vec<PathBuf> = Vec::new();

    // 1. Parse outdated headers under the source roots, then the scan roots.
    let source_files = outdated_files(&cache, &options.source_dirs, options.force);
    if source_files.is_empty() {
        log::info!("All files up to date");
    } else {
        log::info!("Processing {} changed files", source_files.len());
    }
    parse_files(
        &mut parser,
        &mut cache,
        &source_files,
        &mut newly_ingested,
        &mut summary,
    );

    if !options.scan_dirs.is_empty() {
        log::debug!("Scanning for derived classes...");
        let scan_files = outdated_files(&cache, &options.scan_dirs, options.force);
        parse_files(
            &mut parser,
            &mut cache,
            &scan_files,
            &mut newly_ingested,
            &mut summary,
        );
    }

    // 2. Drop cache entries for files that vanished from every input root,
    //    before resolution so a deleted derived class leaves its family in
    //    this run's output rather than the next one's.
    let mut all_roots = options.source_dirs.clone();
    all_roots.extend(options.scan_dirs.iter().cloned());
    let present: HashSet<String> = scan_headers(&all_roots, DEFAULT_EXTENSIONS)
        .iter()
        .map(|p| canonical_key(p))
        .collect();
    summary.pruned = cache.prune(&present);
    if summary.pruned > 0 {
        log::debug!("Removed {} deleted files from cache", summary.pruned);
    }

    // 3. Resolve factory families over the full cache contents.
    let families = resolve_families(&cache, &options.include_dirs);

    // 4. Per-source headers for freshly parsed files with reflected entities.
    for path in &newly_ingested {
        let classes = cache.classes_in(path);
        let enums = cache.enums_in(path);
        match renderer.render_reflection(classes, enums, path, &options.include_dirs) {
            Ok(Some(output)) => {
                summary.generated += 1;
                log::debug!("  Generated: {}", output.display());
            }
            Ok(None) => {}
            Err(e) => {
                summary.errors += 1;
                eprintln!("Error rendering {}: {e}", path.display());
            }
        }
    }

    // 5. One factory header per family, regenerated every run.
    for family in &families {
        log::debug!(
            "Generating factory for {}: {} derived classes",
            family.base.name,
            family.derived.len()
        );
        let source_header_name = format!("{}.h", family.base.name);
        match renderer.render_factory(family, &source_header_name) {
            Ok(output) => {
                summary.generated += 1;
                log::debug!("  Generated: {}", output.display());
            }
            Err(e) => {
                summary.errors += 1;
                eprintln!("Error rendering factory for {}: {e}", family.base.name);
            }
        }
    }

    // 6. Persist. A failed save is fatal: generated outputs must never
    //    outrun the cache state that justified them.
    cache.save().map_err(FatalError::CacheWrite)?;

    let stats = cache.stats();
    log::info!(
        "Done: {} files processed, {} files generated",
        summary.parsed,
        summary.generated
    );
    if summary.errors > 0 {
        log::info!("  Errors: {}", summary.errors);
    }
    log::debug!(
        "  Cache: {} files, {} classes, {} enums",
        stats.files,
        stats.classes,
        stats.enums
    );

    Ok(summary)
}

/// Headers to parse this pass: everything under the roots when forced,
/// otherwise the outdated subset.
fn outdated_files(cache: &MetadataCache, roots: &[PathBuf], force: bool) -> Vec<PathBuf> {
    if force {
        scan_headers(roots, DEFAULT_EXTENSIONS)
    } else {
        cache.enumerate_outdated(roots, DEFAULT_EXTENSIONS)
    }
}

/// Parse a batch of files, ingesting successes and counting failures.
fn parse_files(
    parser: &mut CppParser,
    cache: &mut MetadataCache,
    files: &[PathBuf],
    newly_ingested: &mut Vec<PathBuf>,
    summary: &mut RunSummary,
) {
    for path in files {
        log::debug!("  Parsing: {}", path.display());
        match parser.parse(path) {
            Ok((classes, enums)) => {
                cache.ingest(path, classes, enums);
                newly_ingested.push(path.clone());
                summary.parsed += 1;
            }
            Err(e) => {
                summary.errors += 1;
                eprintln!("Error processing {}: {e}", path.display());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
