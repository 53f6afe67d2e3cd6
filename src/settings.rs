//! Player preferences
//!
//! Persisted separately from the session record, through the same storage.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, Storage};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === HUD ===
    /// Show the time/deaths/intensity overlay (F1)
    pub show_debug: bool,

    // === Session ===
    /// Greet players who return within this many days
    pub welcome_back_days: f64,
    /// Carry the previous session's deaths into the next one
    pub restore_deaths: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.5,
            muted: false,
            mute_on_blur: true,
            show_debug: false,
            welcome_back_days: 7.0,
            restore_deaths: true,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "no_end_settings";

    /// Load settings, falling back to defaults on any problem
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(mut settings) => {
                    settings.master_volume = settings.master_volume.clamp(0.0, 1.0);
                    log::info!("Loaded settings from storage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Settings storage unavailable: {e}"),
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save<S: Storage + ?Sized>(&self, storage: &mut S) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        storage.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_defaults_when_empty() {
        let storage = MemoryStorage::new();
        assert_eq!(Settings::load(&storage), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let mut storage = MemoryStorage::new();
        let settings = Settings {
            master_volume: 0.2,
            show_debug: true,
            restore_deaths: false,
            ..Default::default()
        };
        settings.save(&mut storage).unwrap();
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_garbage_and_partial_input() {
        let mut storage = MemoryStorage::new();
        storage.set(Settings::STORAGE_KEY, "][").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());

        storage
            .set(Settings::STORAGE_KEY, r#"{"master_volume": 4.0}"#)
            .unwrap();
        let loaded = Settings::load(&storage);
        assert_eq!(loaded.master_volume, 1.0);
        assert_eq!(loaded.welcome_back_days, 7.0);
    }
}
