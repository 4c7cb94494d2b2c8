//! Cross-file factory resolution.
//!
//! Pairs every class registered with `FACTORY_BASE` against the full cache
//! contents to collect its directly derived classes, producing one
//! [`FactoryFamily`] per base that has at least one derived class. The pass
//! is read-only over the cache and fully deterministic: classes are deduped
//! and sorted by `full_qualified_name`, so equal cache states always yield
//! equal family lists.
//!
//! Naming follows the engine's factory conventions: a leading `I` is
//! stripped from the base name, derived classes lose the suffix they share
//! with the base (`ConsoleSink` under `ILogSink` becomes `Console`), and the
//! generated types are `<Base>Type` and `<Base>Factory`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::MetadataCache;
use crate::types::{ClassInfo, DerivedClass, FactoryFamily};

/// Strip a leading `I` interface prefix (`ILogSink` → `LogSink`).
#[must_use]
pub fn strip_leading_i(name: &str) -> &str {
    match name.strip_prefix('I') {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

/// Enum type name generated for a factory base (`ILogSink` → `LogSinkType`).
#[must_use]
pub fn enum_type_name(base_name: &str) -> String {
    format!("{}Type", strip_leading_i(base_name))
}

/// Factory type name generated for a factory base
/// (`ILogSink` → `LogSinkFactory`).
#[must_use]
pub fn factory_name(base_name: &str) -> String {
    format!("{}Factory", strip_leading_i(base_name))
}

/// Enum-constant name for a derived class: the class name minus the longest
/// suffix it shares with the base name (leading `I` stripped). The result is
/// never empty — when the whole name would be consumed, the full name stays.
///
/// `ConsoleSink` + `ILogSink` → `Console`; `ClearScreenWidget` + `IWidget` →
/// `ClearScreen`; `Widget` + `IWidget` → `Widget`.
#[must_use]
pub fn short_name(derived: &str, base: &str) -> String {
    let base_suffix = strip_leading_i(base);
    let common = common_suffix_len(derived, base_suffix);

    if common > 0 && common < derived.len() {
        derived[..derived.len() - common].to_owned()
    } else {
        derived.to_owned()
    }
}

/// Length in bytes of the longest common suffix of two identifiers.
fn common_suffix_len(a: &str, b: &str) -> usize {
    a.bytes()
        .rev()
        .zip(b.bytes().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Header include path for a source file: relative to the first matching
/// include directory, with forward slashes. Falls back to the bare file name
/// when no directory matches; ambiguous, but resolvable by the consumer's
/// include search path.
#[must_use]
pub fn include_path(source_file: &str, include_dirs: &[PathBuf]) -> String {
    let source = Path::new(source_file);
    let canonical = source.canonicalize().unwrap_or_else(|_| source.to_path_buf());

    for dir in include_dirs {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.clone());
        if let Ok(rel) = canonical.strip_prefix(&dir) {
            return rel.to_string_lossy().replace('\\', "/");
        }
    }

    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build every non-empty factory family from the cache contents.
///
/// Duplicate `full_qualified_name`s are a cache-consistency error: they are
/// reported and resolved deterministically in favor of the entry with the
/// newest `last_scanned` (lexicographically later path on a tie). Two factory
/// bases sharing a simple name are also reported, since their generated
/// headers would collide on disk.
#[must_use]
pub fn resolve_families(cache: &MetadataCache, include_dirs: &[PathBuf]) -> Vec<FactoryFamily> {
    let classes = dedupe_classes(cache);

    let bases: Vec<&ClassInfo> = classes
        .values()
        .filter(|c| c.is_factory_base)
        .copied()
        .collect();
    warn_on_base_name_collisions(&bases);

    let mut families = Vec::new();

    for base in bases {
        let mut derived: Vec<&ClassInfo> = classes
            .values()
            .filter(|c| c.parent_class.as_deref() == Some(base.name.as_str()))
            .copied()
            .collect();
        derived.sort_by(|a, b| a.full_qualified_name.cmp(&b.full_qualified_name));

        if derived.is_empty() {
            continue;
        }

        let derived = derived
            .into_iter()
            .map(|class| DerivedClass {
                name: class.name.clone(),
                short_name: short_name(&class.name, &base.name),
                full_qualified_name: class.full_qualified_name.clone(),
                source_file: class.source_file.clone(),
                include_path: include_path(&class.source_file, include_dirs),
            })
            .collect();

        families.push(FactoryFamily {
            base: base.clone(),
            enum_type_name: enum_type_name(&base.name),
            factory_name: factory_name(&base.name),
            derived,
        });
    }

    families
}

/// Index all cached classes by `full_qualified_name`, resolving duplicates.
///
/// The cache iterates files in path order, so on a conflict the incumbent
/// loses to an entry with a newer `last_scanned`, or to an equal-aged entry
/// from a later path.
fn dedupe_classes(cache: &MetadataCache) -> BTreeMap<&str, &ClassInfo> {
    let mut by_name: BTreeMap<&str, (&ClassInfo, chrono::DateTime<chrono::Utc>)> =
        BTreeMap::new();

    for file in cache.all_files() {
        for class in &file.classes {
            let key = class.full_qualified_name.as_str();
            match by_name.get(key) {
                Some((_, existing_scanned)) => {
                    log::warn!(
                        "Duplicate class '{}' (also in {}); keeping the most recently parsed",
                        class.full_qualified_name,
                        class.source_file
                    );
                    if file.last_scanned >= *existing_scanned {
                        by_name.insert(key, (class, file.last_scanned));
                    }
                }
                None => {
                    by_name.insert(key, (class, file.last_scanned));
                }
            }
        }
    }

    by_name.into_iter().map(|(k, (c, _))| (k, c)).collect()
}

/// Report factory bases that share a simple name: their generated factory
/// headers would overwrite each other.
fn warn_on_base_name_collisions(bases: &[&ClassInfo]) {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for base in bases {
        if let Some(first) = seen.insert(base.name.as_str(), base.full_qualified_name.as_str()) {
            log::warn!(
                "Factory bases '{}' and '{}' share the simple name '{}'; \
                 their generated headers collide",
                first,
                base.full_qualified_name,
                base.name
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn class(name: &str, parent: Option<&str>, factory: bool, source: &str) -> crate::types::ClassInfo {
        crate::types::ClassInfo {
            name: name.to_owned(),
            qualified_name: name.to_owned(),
            full_qualified_name: format!("BECore::{name}"),
            namespace: "BECore".to_owned(),
            fields: Vec::new(),
            methods: Vec::new(),
            is_factory_base: factory,
            parent_class: parent.map(str::to_owned),
            source_file: source.to_owned(),
            line: 1,
        }
    }

    #[test]
    fn test_strip_leading_i() {
        assert_eq!(strip_leading_i("ILogSink"), "LogSink");
        assert_eq!(strip_leading_i("IWidget"), "Widget");
        assert_eq!(strip_leading_i("Sink"), "Sink");
        assert_eq!(strip_leading_i("I"), "I");
    }

    #[test]
    fn test_family_names() {
        assert_eq!(enum_type_name("ILogSink"), "LogSinkType");
        assert_eq!(factory_name("ILogSink"), "LogSinkFactory");
        assert_eq!(enum_type_name("Widget"), "WidgetType");
    }

    #[test]
    fn test_short_name_strips_common_suffix() {
        assert_eq!(short_name("ConsoleSink", "ILogSink"), "Console");
        assert_eq!(short_name("FileSink", "ILogSink"), "File");
        assert_eq!(short_name("MyWidget", "IWidget"), "My");
        assert_eq!(short_name("ClearScreenWidget", "IWidget"), "ClearScreen");
    }

    #[test]
    fn test_short_name_never_empty() {
        // The whole name is the shared suffix; keep it.
        assert_eq!(short_name("Widget", "IWidget"), "Widget");
        assert_eq!(short_name("Sink", "ISink"), "Sink");
    }

    #[test]
    fn test_short_name_no_common_suffix() {
        assert_eq!(short_name("Console", "IBar"), "Console");
    }

    #[test]
    fn test_include_path_relative_to_include_dir() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("Widgets");
        fs::create_dir_all(&sub).unwrap();
        let header = sub.join("ClearScreenWidget.h");
        fs::write(&header, "// w").unwrap();

        let result = include_path(
            &header.display().to_string(),
            &[dir.path().to_path_buf()],
        );
        assert_eq!(result, "Widgets/ClearScreenWidget.h");
    }

    #[test]
    fn test_include_path_first_match_wins() {
        let dir = tempdir().unwrap();
        let outer = dir.path().to_path_buf();
        let inner = dir.path().join("Modules");
        fs::create_dir_all(&inner).unwrap();
        let header = inner.join("Sink.h");
        fs::write(&header, "// s").unwrap();

        let result = include_path(&header.display().to_string(), &[inner.clone(), outer]);
        assert_eq!(result, "Sink.h");
    }

    #[test]
    fn test_include_path_fallback_to_file_name() {
        let dir = tempdir().unwrap();
        let header = dir.path().join("Orphan.h");
        fs::write(&header, "// o").unwrap();
        let elsewhere = tempdir().unwrap();

        let result = include_path(
            &header.display().to_string(),
            &[elsewhere.path().to_path_buf()],
        );
        assert_eq!(result, "Orphan.h");
    }

    #[test]
    fn test_resolve_builds_sorted_family() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("ISink.h");
        let b = dir.path().join("Sinks.h");
        fs::write(&a, "// base").unwrap();
        fs::write(&b, "// derived").unwrap();

        let mut cache = crate::cache::MetadataCache::new(dir.path().join("cache.json"));
        cache.ingest(&a, vec![class("ISink", None, true, "/src/ISink.h")], Vec::new());
        cache.ingest(
            &b,
            vec![
                class("FileSink", Some("ISink"), false, "/src/FileSink.h"),
                class("ConsoleSink", Some("ISink"), false, "/src/ConsoleSink.h"),
            ],
            Vec::new(),
        );

        let families = resolve_families(&cache, &[]);
        assert_eq!(families.len(), 1);

        let family = &families[0];
        assert_eq!(family.base.name, "ISink");
        assert_eq!(family.enum_type_name, "SinkType");
        assert_eq!(family.factory_name, "SinkFactory");
        // Sorted by full_qualified_name: ConsoleSink before FileSink.
        assert_eq!(family.derived[0].short_name, "Console");
        assert_eq!(family.derived[1].short_name, "File");
    }

    #[test]
    fn test_base_without_derived_is_dropped() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("ISink.h");
        fs::write(&a, "// base").unwrap();

        let mut cache = crate::cache::MetadataCache::new(dir.path().join("cache.json"));
        cache.ingest(&a, vec![class("ISink", None, true, "/src/ISink.h")], Vec::new());

        assert!(resolve_families(&cache, &[]).is_empty());
    }

    #[test]
    fn test_transitive_inheritance_not_collapsed() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("All.h");
        fs::write(&a, "// all").unwrap();

        let mut cache = crate::cache::MetadataCache::new(dir.path().join("cache.json"));
        cache.ingest(
            &a,
            vec![
                class("IWidget", None, true, "/src/IWidget.h"),
                class("BaseWidget", Some("IWidget"), false, "/src/BaseWidget.h"),
                class("FancyWidget", Some("BaseWidget"), false, "/src/FancyWidget.h"),
            ],
            Vec::new(),
        );

        let families = resolve_families(&cache, &[]);
        assert_eq!(families.len(), 1);
        // Only the direct child joins the family.
        assert_eq!(families[0].derived.len(), 1);
        assert_eq!(families[0].derived[0].name, "BaseWidget");
    }

    #[test]
    fn test_base_can_also_be_derived() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("All.h");
        fs::write(&a, "// all").unwrap();

        let mut cache = crate::cache::MetadataCache::new(dir.path().join("cache.json"));
        cache.ingest(
            &a,
            vec![
                class("ISink", None, true, "/src/ISink.h"),
                class("IBufferedSink", Some("ISink"), true, "/src/IBufferedSink.h"),
                class("RingSink", Some("IBufferedSink"), false, "/src/RingSink.h"),
            ],
            Vec::new(),
        );

        let families = resolve_families(&cache, &[]);
        assert_eq!(families.len(), 2);

        let sink_family = families.iter().find(|f| f.base.name == "ISink").unwrap();
        assert_eq!(sink_family.derived.len(), 1);
        assert_eq!(sink_family.derived[0].name, "IBufferedSink");

        let buffered = families
            .iter()
            .find(|f| f.base.name == "IBufferedSink")
            .unwrap();
        assert_eq!(buffered.derived[0].name, "RingSink");
    }

    #[test]
    fn test_resolver_is_pure() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("All.h");
        fs::write(&a, "// all").unwrap();

        let mut cache = crate::cache::MetadataCache::new(dir.path().join("cache.json"));
        cache.ingest(
            &a,
            vec![
                class("ISink", None, true, "/src/ISink.h"),
                class("ConsoleSink", Some("ISink"), false, "/src/ConsoleSink.h"),
            ],
            Vec::new(),
        );

        let first = resolve_families(&cache, &[]);
        let second = resolve_families(&cache, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_full_name_keeps_newest() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A.h");
        let b = dir.path().join("B.h");
        fs::write(&a, "// a").unwrap();
        fs::write(&b, "// b").unwrap();

        let mut cache = crate::cache::MetadataCache::new(dir.path().join("cache.json"));
        cache.ingest(&a, vec![class("ISink", None, true, "/src/A.h")], Vec::new());
        // Same full_qualified_name ingested later, without the factory flag.
        cache.ingest(&b, vec![class("ISink", None, false, "/src/B.h")], Vec::new());
        cache.ingest(
            &dir.path().join("C.h"),
            vec![class("ConsoleSink", Some("ISink"), false, "/src/C.h")],
            Vec::new(),
        );

        // The later ingest wins, so no factory base survives.
        assert!(resolve_families(&cache, &[]).is_empty());
    }
}
