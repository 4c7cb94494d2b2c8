//! Incremental reflection metadata engine for BagiEngine C++ headers.
//!
//! Scans source trees for headers carrying reflection markers, caches the
//! extracted metadata keyed by content hash so repeat runs only re-parse
//! changed files, resolves factory families across the whole cache, and
//! renders the generated reflection and factory headers consumed by the
//! engine build.
//!
//! The `be-metagen` binary wires these modules together; the library surface
//! exists so the pieces stay independently testable.

pub mod cache;
pub mod cli;
pub mod discovery;
pub mod engine;
pub mod parser;
pub mod render;
pub mod resolver;
pub mod settings;
pub mod types;
