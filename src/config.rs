use serde::{Deserialize, Serialize};

use crate::corpus::ALL_LANGUAGES;
use crate::storage::{KeyValueStore, StorageError};

/// Key of the persisted preferences record.
pub const SETTINGS_KEY: &str = "coderacer-settings";

/// User preferences, persisted as one JSON record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(rename = "selectedTheme")]
    pub theme: String,
    pub sound_enabled: bool,
    pub show_line_numbers: bool,
    pub focus_mode: bool,
    pub auto_start_game: bool,
    /// A language key, or `all`.
    pub language_preference: String,
    pub mixed_language_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "vscode-dark".to_string(),
            sound_enabled: true,
            show_line_numbers: true,
            focus_mode: false,
            auto_start_game: false,
            language_preference: ALL_LANGUAGES.to_string(),
            mixed_language_mode: false,
        }
    }
}

/// Boolean preferences that can be flipped in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Sound,
    LineNumbers,
    FocusMode,
    AutoStart,
    MixedLanguage,
}

impl Preferences {
    /// Stored preferences, or defaults when missing or unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let loaded = store.get(SETTINGS_KEY).and_then(|raw| match raw {
            Some(json) => Ok(Some(serde_json::from_str::<Preferences>(&json)?)),
            None => Ok(None),
        });
        match loaded {
            Ok(prefs) => prefs.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load preferences, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)?;
        store.put(SETTINGS_KEY, &json)
    }

    pub fn toggle(&mut self, setting: Setting) {
        let flag = match setting {
            Setting::Sound => &mut self.sound_enabled,
            Setting::LineNumbers => &mut self.show_line_numbers,
            Setting::FocusMode => &mut self.focus_mode,
            Setting::AutoStart => &mut self.auto_start_game,
            Setting::MixedLanguage => &mut self.mixed_language_mode,
        };
        *flag = !*flag;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingStore, MemoryStore, SqliteStore};
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_preferences() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("state.db")).unwrap();
        let prefs = Preferences::default();
        prefs.save(&store).unwrap();

        assert_eq!(Preferences::load(&store), prefs);
    }

    #[test]
    fn save_and_load_custom_preferences() {
        let store = MemoryStore::new();
        let prefs = Preferences {
            theme: "dracula".into(),
            sound_enabled: false,
            show_line_numbers: false,
            focus_mode: true,
            auto_start_game: true,
            language_preference: "rust".into(),
            mixed_language_mode: true,
        };
        prefs.save(&store).unwrap();

        assert_eq!(Preferences::load(&store), prefs);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let store = MemoryStore::new();
        store
            .put(SETTINGS_KEY, r#"{"selectedTheme": "monokai", "focusMode": true}"#)
            .unwrap();

        let prefs = Preferences::load(&store);
        assert_eq!(prefs.theme, "monokai");
        assert!(prefs.focus_mode);
        assert!(prefs.sound_enabled);
        assert_eq!(prefs.language_preference, "all");
    }

    #[test]
    fn unreadable_store_gives_defaults() {
        assert_eq!(Preferences::load(&FailingStore), Preferences::default());
        assert!(Preferences::default().save(&FailingStore).is_err());
    }

    #[test]
    fn toggle_and_reset() {
        let mut prefs = Preferences::default();
        prefs.toggle(Setting::MixedLanguage);
        prefs.toggle(Setting::Sound);
        assert!(prefs.mixed_language_mode);
        assert!(!prefs.sound_enabled);

        prefs.toggle(Setting::MixedLanguage);
        assert!(!prefs.mixed_language_mode);

        prefs.language_preference = "go".into();
        prefs.reset();
        assert_eq!(prefs, Preferences::default());
    }
}
