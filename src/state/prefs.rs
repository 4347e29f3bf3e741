/// Local persistent key-value store for per-install settings
///
/// Holds the anonymous cart session id and the admin edit-mode flag.
/// Stored as a small JSON file next to the database; nothing in it expires.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// Anonymous cart session, created on first cart use
    pub session_id: Option<String>,
    /// Whether an admin sees inline edit controls on storefront pages
    pub admin_edit_mode: bool,
}

impl Preferences {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Preferences plus where they are saved
#[derive(Debug)]
pub struct PreferenceStore {
    /// None keeps everything in memory (tests, dry runs)
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Load preferences from `path`, starting empty if the file is missing.
    /// A corrupt file is replaced with defaults on the next save.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let prefs = match fs::read_to_string(&path) {
            Ok(text) => Preferences::from_json(&text).unwrap_or_else(|e| {
                warn!("ignoring unreadable preferences at {}: {}", path.display(), e);
                Preferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            prefs,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            prefs: Preferences::default(),
        }
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    /// Apply a change and persist it
    pub fn update(&mut self, change: impl FnOnce(&mut Preferences)) -> Result<(), StoreError> {
        let mut next = self.prefs.clone();
        change(&mut next);
        self.save(&next)?;
        self.prefs = next;
        Ok(())
    }

    fn save(&self, prefs: &Preferences) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, prefs.to_json()?)?;
        Ok(())
    }

    /// Edit mode only ever applies to admins
    pub fn edit_mode(&self, is_admin: bool) -> bool {
        is_admin && self.prefs.admin_edit_mode
    }

    /// Flip edit mode for an admin; non-admins are left untouched.
    /// Returns the resulting mode.
    pub fn toggle_edit_mode(&mut self, is_admin: bool) -> Result<bool, StoreError> {
        if !is_admin {
            return Ok(false);
        }
        self.update(|p| p.admin_edit_mode = !p.admin_edit_mode)?;
        Ok(self.prefs.admin_edit_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("storefront-prefs-{}", crate::ids::random_base36(10)))
            .join("prefs.json")
    }

    #[test]
    fn test_defaults() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.get(), &Preferences::default());
        assert!(!store.edit_mode(true));
    }

    #[test]
    fn test_persists_across_opens() {
        let path = temp_path();
        {
            let mut store = PreferenceStore::open(&path).unwrap();
            store.update(|p| p.session_id = Some("session_1_abc".into())).unwrap();
        }
        let store = PreferenceStore::open(&path).unwrap();
        assert_eq!(store.get().session_id.as_deref(), Some("session_1_abc"));
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = PreferenceStore::open(&path).unwrap();
        assert_eq!(store.get(), &Preferences::default());
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_edit_mode_requires_admin() {
        let mut store = PreferenceStore::in_memory();
        assert!(!store.toggle_edit_mode(false).unwrap());
        assert!(!store.get().admin_edit_mode);

        assert!(store.toggle_edit_mode(true).unwrap());
        assert!(store.edit_mode(true));
        // A saved flag never leaks to a non-admin
        assert!(!store.edit_mode(false));

        assert!(!store.toggle_edit_mode(true).unwrap());
    }
}
