//! CLI argument definitions using clap.
//!
//! The tool is single-purpose (no subcommands): it is invoked by the build
//! system once per generation step with the directories to scan and the
//! destinations to write.

use std::path::PathBuf;

use clap::Parser;

/// Reflection metadata generator for BagiEngine C++ headers.
#[derive(Debug, Parser)]
#[command(name = "be-metagen", version, about, long_about = None)]
pub struct Arguments {
    /// Source directory to scan for headers (repeatable)
    #[arg(long = "source-dir", short = 's', value_name = "PATH", required = true)]
    pub source_dirs: Vec<PathBuf>,

    /// Output directory for generated headers
    #[arg(long = "output-dir", short = 'o', value_name = "PATH")]
    pub output_dir: PathBuf,

    /// Directory holding the metadata cache file
    #[arg(long = "cache-dir", short = 'c', value_name = "PATH")]
    pub cache_dir: PathBuf,

    /// Include directory for computing generated include paths (repeatable)
    #[arg(long = "include-dir", short = 'I', value_name = "PATH")]
    pub include_dirs: Vec<PathBuf>,

    /// Additional directory to scan for derived classes (repeatable)
    #[arg(long = "scan-dir", short = 'S', value_name = "PATH")]
    pub scan_dirs: Vec<PathBuf>,

    /// Path to a settings JSON file
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Project-root namespace that generated code is scoped against
    #[arg(long, value_name = "NAMESPACE", default_value = "BECore")]
    pub project_namespace: String,

    /// Force a full rescan, ignoring the cache
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Enable per-file output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Arguments {
    /// Log filter derived from the verbosity flags.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
