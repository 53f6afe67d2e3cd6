//! Best-effort session persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Migration from the flat keys older builds wrote
//! - Pluggable key/value storage (LocalStorage on web, memory elsewhere)
//!
//! Nothing here may stop the game: callers log failures and carry on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;
use crate::sim::SessionCounters;

/// Storage key of the session envelope
pub const SESSION_KEY: &str = "no_end_session";
/// Current envelope version
pub const RECORD_VERSION: u32 = 1;

const LEGACY_DEATHS_KEY: &str = "noEndGame_deathCount";
const LEGACY_INTENSITY_KEY: &str = "noEndGame_glitchIntensity";
const LEGACY_LAST_PLAYED_KEY: &str = "noEndGame_lastPlayed";

const MS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Persistence failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("stored record has unsupported version {0}")]
    UnsupportedVersion(u32),
}

/// String key/value store
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-process storage for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{PersistenceError, Storage};

    fn backend(err: wasm_bindgen::JsValue) -> PersistenceError {
        PersistenceError::Backend(format!("{err:?}"))
    }

    /// The page's `window.localStorage`
    pub struct LocalStorage {
        inner: web_sys::Storage,
    }

    impl LocalStorage {
        pub fn open() -> Result<Self, PersistenceError> {
            let window = web_sys::window()
                .ok_or_else(|| PersistenceError::Unavailable("no window".into()))?;
            let inner = window
                .local_storage()
                .map_err(backend)?
                .ok_or_else(|| PersistenceError::Unavailable("localStorage disabled".into()))?;
            Ok(Self { inner })
        }
    }

    impl Storage for LocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get_item(key).map_err(backend)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
            self.inner.set_item(key, value).map_err(backend)
        }

        fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
            self.inner.remove_item(key).map_err(backend)
        }
    }
}

/// What survives between sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub deaths: u32,
    pub last_intensity: f32,
    /// Unix time in milliseconds
    pub last_played_ms: f64,
}

impl SessionRecord {
    pub fn capture(counters: &SessionCounters, intensity: f32, now_ms: f64) -> Self {
        Self {
            deaths: counters.deaths,
            last_intensity: intensity,
            last_played_ms: now_ms,
        }
    }

    pub fn days_since(&self, now_ms: f64) -> f64 {
        (now_ms - self.last_played_ms) / MS_PER_DAY
    }

    /// Played within the last `days` days. Clock skew into the future counts
    /// as recent.
    pub fn is_recent(&self, now_ms: f64, days: f64) -> bool {
        self.days_since(now_ms) < days
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    record: SessionRecord,
}

/// Write the session record
pub fn save_session<S: Storage + ?Sized>(
    storage: &mut S,
    record: &SessionRecord,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(&Envelope {
        version: RECORD_VERSION,
        record: *record,
    })?;
    storage.set(SESSION_KEY, &json)?;
    log::debug!("Session saved ({} deaths)", record.deaths);
    Ok(())
}

/// Read the session record, migrating legacy keys if that is all there is
pub fn load_session<S: Storage + ?Sized>(
    storage: &mut S,
) -> Result<Option<SessionRecord>, PersistenceError> {
    if let Some(json) = storage.get(SESSION_KEY)? {
        let envelope: Envelope = serde_json::from_str(&json)?;
        if envelope.version != RECORD_VERSION {
            return Err(PersistenceError::UnsupportedVersion(envelope.version));
        }
        return Ok(Some(envelope.record));
    }

    let Some(record) = read_legacy(storage)? else {
        return Ok(None);
    };
    log::info!("Migrating legacy session keys");
    save_session(storage, &record)?;
    for key in [LEGACY_DEATHS_KEY, LEGACY_INTENSITY_KEY, LEGACY_LAST_PLAYED_KEY] {
        storage.remove(key)?;
    }
    Ok(Some(record))
}

fn read_legacy<S: Storage + ?Sized>(storage: &S) -> Result<Option<SessionRecord>, PersistenceError> {
    let Some(last_played) = storage.get(LEGACY_LAST_PLAYED_KEY)? else {
        return Ok(None);
    };
    let Ok(last_played_ms) = last_played.trim().parse::<f64>() else {
        return Ok(None);
    };
    let deaths = storage
        .get(LEGACY_DEATHS_KEY)?
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let last_intensity = storage
        .get(LEGACY_INTENSITY_KEY)?
        .and_then(|s| s.trim().parse::<f32>().ok())
        .unwrap_or(0.0);
    Ok(Some(SessionRecord {
        deaths,
        last_intensity,
        last_played_ms,
    }))
}

/// How a new session picks up from the last one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resume {
    /// Greet the returning player
    pub welcome_back: bool,
    /// Deaths carried into the new session
    pub deaths: u32,
}

/// Decide what to carry over from `record`
pub fn plan_resume(record: Option<&SessionRecord>, now_ms: f64, settings: &Settings) -> Resume {
    let Some(record) = record else {
        return Resume::default();
    };
    Resume {
        welcome_back: record.is_recent(now_ms, settings.welcome_back_days),
        deaths: if settings.restore_deaths { record.deaths } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_700_000_000_000.0;

    fn record(deaths: u32, days_ago: f64) -> SessionRecord {
        SessionRecord {
            deaths,
            last_intensity: 0.4,
            last_played_ms: NOW - days_ago * MS_PER_DAY,
        }
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_session(&mut storage).unwrap(), None);

        let rec = record(4, 1.0);
        save_session(&mut storage, &rec).unwrap();
        assert_eq!(load_session(&mut storage).unwrap(), Some(rec));
    }

    #[test]
    fn test_corrupt_and_future_records_are_errors() {
        let mut storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "{not json").unwrap();
        assert!(matches!(load_session(&mut storage), Err(PersistenceError::Corrupt(_))));

        storage
            .set(
                SESSION_KEY,
                r#"{"version":9,"record":{"deaths":1,"last_intensity":0.0,"last_played_ms":0.0}}"#,
            )
            .unwrap();
        assert!(matches!(
            load_session(&mut storage),
            Err(PersistenceError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_legacy_keys_are_migrated() {
        let mut storage = MemoryStorage::new();
        storage.set(LEGACY_DEATHS_KEY, "7").unwrap();
        storage.set(LEGACY_INTENSITY_KEY, "0.83").unwrap();
        storage.set(LEGACY_LAST_PLAYED_KEY, "1699999999000").unwrap();

        let rec = load_session(&mut storage).unwrap().unwrap();
        assert_eq!(rec.deaths, 7);
        assert_eq!(rec.last_played_ms, 1_699_999_999_000.0);

        assert_eq!(storage.get(LEGACY_DEATHS_KEY).unwrap(), None);
        assert!(storage.get(SESSION_KEY).unwrap().is_some());
        assert_eq!(load_session(&mut storage).unwrap(), Some(rec));
    }

    #[test]
    fn test_welcome_back_window() {
        let settings = Settings::default();
        assert!(plan_resume(Some(&record(0, 6.9)), NOW, &settings).welcome_back);
        assert!(!plan_resume(Some(&record(0, 7.1)), NOW, &settings).welcome_back);
        assert_eq!(plan_resume(None, NOW, &settings), Resume::default());
    }

    #[test]
    fn test_death_restore_is_optional() {
        let mut settings = Settings::default();
        assert_eq!(plan_resume(Some(&record(3, 1.0)), NOW, &settings).deaths, 3);
        settings.restore_deaths = false;
        assert_eq!(plan_resume(Some(&record(3, 1.0)), NOW, &settings).deaths, 0);
    }
}
