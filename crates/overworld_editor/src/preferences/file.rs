//! Reading and writing `preferences.json`

use super::EditorPreferences;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const PREFERENCES_FILE: &str = "preferences.json";

/// Why the preferences file could not be used
#[derive(Debug)]
pub enum PreferencesError {
    /// The file exists but could not be read
    Read { path: PathBuf, message: String },
    /// The file is not valid preferences JSON
    Parse { path: PathBuf, message: String },
    /// The preferences could not be turned into JSON
    Serialize(String),
    /// The file or its directory could not be written
    Write { path: PathBuf, message: String },
    /// The platform reports no per-user config location
    NoConfigDir,
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::Read { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            PreferencesError::Parse { path, message } => {
                write!(f, "{} is malformed: {}", path.display(), message)
            }
            PreferencesError::Serialize(message) => {
                write!(f, "cannot encode preferences: {}", message)
            }
            PreferencesError::Write { path, message } => {
                write!(f, "cannot write {}: {}", path.display(), message)
            }
            PreferencesError::NoConfigDir => write!(f, "no user config directory on this platform"),
        }
    }
}

impl std::error::Error for PreferencesError {}

impl EditorPreferences {
    /// Per-user directory holding the editor's settings
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "overworld_editor", "overworld_editor")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Where [`load`](Self::load) and [`save`](Self::save) look
    pub fn preferences_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(PREFERENCES_FILE))
    }

    /// Settings for this session; any failure is logged and yields defaults
    pub fn load() -> Self {
        let loaded = Self::preferences_path()
            .ok_or(PreferencesError::NoConfigDir)
            .and_then(|path| Self::load_from(&path));
        loaded.unwrap_or_else(|e| {
            bevy::log::warn!("Falling back to default preferences ({})", e);
            Self::default()
        })
    }

    /// Read settings from `path`. A file that doesn't exist yet is not an error.
    pub fn load_from(path: &Path) -> Result<Self, PreferencesError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| PreferencesError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| PreferencesError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write settings to the per-user config directory
    pub fn save(&self) -> Result<(), PreferencesError> {
        let path = Self::preferences_path().ok_or(PreferencesError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Write settings to `path` as pretty JSON, creating missing parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), PreferencesError> {
        let write_error = |e: std::io::Error| PreferencesError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PreferencesError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(write_error)?;

        bevy::log::info!("Preferences written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("overworld_editor_prefs_{}", uuid::Uuid::new_v4().simple()))
            .join(name)
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path(PREFERENCES_FILE);
        let mut prefs = EditorPreferences::default();
        prefs.viewport_margin = 128.0;
        prefs.add_recent_world("kingdom.gmap");

        prefs.save_to(&path).unwrap();
        let loaded = EditorPreferences::load_from(&path).unwrap();
        assert_eq!(loaded, prefs);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = scratch_path("absent.json");
        let loaded = EditorPreferences::load_from(&path).unwrap();
        assert_eq!(loaded, EditorPreferences::default());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let path = scratch_path(PREFERENCES_FILE);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, "{ not json").unwrap();

        let result = EditorPreferences::load_from(&path);
        assert!(matches!(result, Err(PreferencesError::Parse { .. })));
        if let Err(e) = result {
            assert!(e.to_string().contains("is malformed"));
        }

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
