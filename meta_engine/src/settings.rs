//! Optional settings file support (`--settings <path>`).
//!
//! The settings file is a small JSON object. Unknown keys are ignored so the
//! file can be shared with other tooling (the launcher writes extra keys).

use std::path::Path;

use serde::Deserialize;

/// Parsed contents of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Directory that held the native parsing library for the previous,
    /// libclang-based generator. Accepted for compatibility with existing
    /// settings files; the grammar is linked into this binary, so the value
    /// is only echoed at debug level.
    #[serde(default)]
    pub llvm_bin_path: Option<String>,
}

/// Errors that can occur while loading the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Failed to read the settings file.
    #[error("Failed to read settings file '{0}': {1}")]
    Read(String, String),

    /// Failed to parse the settings file as JSON.
    #[error("Failed to parse settings file '{0}': {1}")]
    Parse(String, String),
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the file cannot be read or is not valid
    /// JSON. Both are configuration failures the caller treats as fatal.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Read(path.display().to_string(), e.to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| SettingsError::Parse(path.display().to_string(), e.to_string()))
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

    #[test]
    fn test_load_llvm_bin_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"llvm_bin_path": "/usr/lib/llvm-18/lib"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.llvm_bin_path.as_deref(), Some("/usr/lib/llvm-18/lib"));
    }

    #[test]
    fn test_load_ignores_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"editor": "code", "llvm_bin_path": null}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(settings.llvm_bin_path.is_none());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(Settings::load(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json{{").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Parse(_, _))
        ));
    }
}
