//! Core type definitions for the reflection metadata engine.
//!
//! These types form the contract between the parser, the cache, the factory
//! resolver, and the renderer:
//!
//! - [`FieldInfo`] / [`MethodInfo`] / [`ParamInfo`] describe reflected members
//! - [`ClassInfo`] is one `BE_CLASS`-registered class or struct
//! - [`EnumInfo`] is declared enum metadata (not extracted by the parser)
//! - [`FileMetadata`] is the per-file cache unit, keyed by content hash
//! - [`FactoryFamily`] / [`DerivedClass`] are transient resolver output
//!
//! Everything that reaches the cache file serializes with serde; fields added
//! after the first release carry defaults so older entries still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reflected field, marked with `BE_REFLECT_FIELD` or a `reflect` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name as spelled in the declaration.
    pub name: String,
    /// Verbatim textual spelling of the field's type.
    pub type_name: String,
    /// 1-based line of the declaration (0 if unknown).
    #[serde(default)]
    pub line: u32,
    /// 1-based column of the declaration (0 if unknown).
    #[serde(default)]
    pub column: u32,
    /// Whether the type spelling names a scalar or canonical string type.
    ///
    /// Derived from `type_name` via [`is_primitive_type`] at parse time and
    /// persisted so the renderer never re-derives it.
    #[serde(default)]
    pub is_primitive: bool,
}

/// One parameter of a reflected method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    /// Parameter name (empty for unnamed parameters).
    pub name: String,
    /// Verbatim textual spelling of the parameter type.
    pub type_name: String,
}

/// A reflected method, marked with `BE_FUNCTION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name.
    pub name: String,
    /// Verbatim textual spelling of the return type.
    pub return_type: String,
    /// Ordered parameter list.
    #[serde(default)]
    pub params: Vec<ParamInfo>,
    /// Whether the method is `const`-qualified.
    #[serde(default)]
    pub is_const: bool,
    /// Whether the method is declared `virtual`.
    #[serde(default)]
    pub is_virtual: bool,
    /// Whether the declaration carries the `override` specifier.
    #[serde(default)]
    pub is_override: bool,
    /// 1-based line of the declaration (0 if unknown).
    #[serde(default)]
    pub line: u32,
}

/// One constant of a reflected enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Constant name.
    pub name: String,
    /// Explicit value, if one was declared.
    #[serde(default)]
    pub value: Option<i64>,
}

/// Declared enum metadata.
///
/// The header parser never produces these — enum reflection is declared via a
/// dedicated macro outside the parsing pipeline — but they flow through the
/// cache and the per-source renderer like classes do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumInfo {
    /// Simple enum name.
    pub name: String,
    /// Name qualified relative to the project-root namespace.
    pub qualified_name: String,
    /// Enclosing namespace path, `::`-joined (empty at global scope).
    pub namespace: String,
    /// Underlying type spelling.
    #[serde(default = "default_underlying_type")]
    pub underlying_type: String,
    /// Ordered constants.
    #[serde(default)]
    pub values: Vec<EnumValue>,
    /// 1-based line of the declaration (0 if unknown).
    #[serde(default)]
    pub line: u32,
}

fn default_underlying_type() -> String {
    "int".to_owned()
}

/// A reflected class or struct, registered with `BE_CLASS(Name)` or
/// `BE_CLASS(Name, FACTORY_BASE)` inside its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Simple class name.
    pub name: String,
    /// Name relative to the project-root namespace.
    ///
    /// Generated code emitted inside `namespace <project-root> { ... }` uses
    /// this spelling (e.g. `TestData::Player` for `BECore::TestData::Player`).
    pub qualified_name: String,
    /// Absolute qualified name with no leading `::` (e.g. `BECore::Player`).
    pub full_qualified_name: String,
    /// Enclosing namespace path, `::`-joined (empty at global scope).
    pub namespace: String,
    /// Reflected fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    /// Reflected methods, in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    /// Whether the registration macro carried the `FACTORY_BASE` option.
    ///
    /// Set only by the class's own declaration; never inherited.
    #[serde(default)]
    pub is_factory_base: bool,
    /// Simple name of the first direct base class, if any.
    #[serde(default)]
    pub parent_class: Option<String>,
    /// Absolute path of the header this class was parsed from.
    #[serde(default)]
    pub source_file: String,
    /// 1-based line of the declaration (0 if unknown).
    #[serde(default)]
    pub line: u32,
}

/// Per-file metadata: the unit of caching.
///
/// `content_hash` equals the SHA-256 of the bytes at `path` as of the last
/// successful parse; a differing hash marks the file outdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Canonicalized absolute path.
    pub path: String,
    /// Lowercase hex SHA-256 of the raw file bytes.
    pub content_hash: String,
    /// When this file was last successfully parsed.
    pub last_scanned: DateTime<Utc>,
    /// Classes found in the file, in declaration order.
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    /// Declared enums attached to the file.
    #[serde(default)]
    pub enums: Vec<EnumInfo>,
}

// ---------------------------------------------------------------------------
// Resolver output (transient, never persisted)
// ---------------------------------------------------------------------------

/// A derived class collected into a factory family.
///
/// Serializable only to feed the renderer's template context; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedClass {
    /// Simple class name (e.g. `ConsoleSink`).
    pub name: String,
    /// Enum-constant name: the class name minus the suffix it shares with the
    /// base (e.g. `Console` for `ConsoleSink` under `ILogSink`).
    pub short_name: String,
    /// Absolute qualified name with no leading `::`.
    pub full_qualified_name: String,
    /// Absolute path of the defining header.
    pub source_file: String,
    /// Header path relative to the first matching include directory, with
    /// forward slashes; falls back to the file's base name.
    pub include_path: String,
}

/// One factory base paired with every class directly derived from it.
///
/// Built per run by the resolver from the full cache contents; families with
/// no derived classes are never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryFamily {
    /// The factory base class.
    pub base: ClassInfo,
    /// Generated enum type name (e.g. `LogSinkType` for `ILogSink`).
    pub enum_type_name: String,
    /// Generated factory type name (e.g. `LogSinkFactory` for `ILogSink`).
    pub factory_name: String,
    /// Derived classes, sorted by `full_qualified_name`.
    pub derived: Vec<DerivedClass>,
}

// ---------------------------------------------------------------------------
// Primitive-type derivation
// ---------------------------------------------------------------------------

/// Scalar and canonical string spellings that count as primitive.
const PRIMITIVE_TYPES: &[&str] = &[
    "bool",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "signed char",
    "unsigned char",
    "short",
    "unsigned short",
    "int",
    "unsigned",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "float",
    "double",
    "char",
    "wchar_t",
    "char8_t",
    "char16_t",
    "char32_t",
    "std::string",
    "std::string_view",
    "BEString",
];

/// String-template spellings whose instantiations count as primitive.
const PRIMITIVE_PREFIXES: &[&str] = &["std::basic_string<", "BEString<"];

/// Decide whether a type spelling names a primitive for reflection purposes.
///
/// Normalizes the spelling by dropping `const` and `volatile` qualifiers,
/// trailing `&`/`*` declarators, and surrounding whitespace, then matches the
/// remainder against the closed scalar/string set or the string-template
/// prefixes. Any change to either set is a cache schema change.
#[must_use]
pub fn is_primitive_type(type_name: &str) -> bool {
    let normalized = normalize_type_spelling(type_name);
    if PRIMITIVE_TYPES.contains(&normalized.as_str()) {
        return true;
    }
    PRIMITIVE_PREFIXES.iter().any(|p| normalized.starts_with(p))
}

/// Strip cv-qualifiers, trailing `&`/`*`, and excess whitespace from a type
/// spelling.
fn normalize_type_spelling(type_name: &str) -> String {
    let mut rest = type_name.trim();

    // Trailing reference/pointer declarators, possibly stacked (`int**`, `T&&`).
    while let Some(stripped) = rest
        .strip_suffix('&')
        .or_else(|| rest.strip_suffix('*'))
        .map(str::trim_end)
    {
        rest = stripped;
    }

    // Drop cv-qualifier words wherever they appear, then collapse whitespace.
    rest.split_whitespace()
        .filter(|word| *word != "const" && *word != "volatile")
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
