/// Settings store
///
/// A single JSON file of string-keyed values under the user data dir. Loaded
/// once at startup, rewritten on every set. When the file (or its directory)
/// is unusable the store degrades to in-memory defaults and keeps working for
/// the session, it just cannot persist.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, serde_json::Value>,
    /// False when the backing file could not be read or written; the store
    /// then runs in-memory only.
    available: bool,
}

impl SettingsStore {
    /// Open the default store under the platform data dir.
    pub fn open() -> Self {
        let path = Self::default_path();
        Self::open_at(path)
    }

    /// Open a store at an explicit path. Missing file means empty store.
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let (values, available) = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => (map, true),
                Err(e) => {
                    eprintln!("⚠️  Settings file is corrupt, starting from defaults: {e}");
                    (BTreeMap::new(), true)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (BTreeMap::new(), true),
            Err(e) => {
                eprintln!("⚠️  Cannot read settings ({e}); changes this session won't persist");
                (BTreeMap::new(), false)
            }
        };

        Self {
            path,
            values,
            available,
        }
    }

    fn default_path() -> PathBuf {
        let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("startpage");
        dir.push("settings.json");
        dir
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Fetch and deserialize a value. Missing or mismatched values read as
    /// None so callers fall back to their defaults.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Raw JSON value, for export.
    pub fn raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Store a value and flush the file.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.set_raw(key, json),
            Err(e) => eprintln!("⚠️  Failed to serialize setting '{key}': {e}"),
        }
    }

    /// Store an already-built JSON value, for import.
    pub fn set_raw(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
        self.flush();
    }

    /// Drop a key if present.
    pub fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if !self.available {
            return;
        }

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("⚠️  Cannot create settings dir ({e}); persistence disabled");
                self.available = false;
                return;
            }
        }

        let text = match serde_json::to_string_pretty(&self.values) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("⚠️  Failed to serialize settings: {e}");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, text) {
            eprintln!("⚠️  Cannot write settings ({e}); persistence disabled");
            self.available = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_at(dir.path().join("settings.json"));
        assert!(store.is_available());
        assert!(store.get::<String>("anything").is_none());
    }

    #[test]
    fn test_set_then_reopen_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open_at(&path);
        store.set("greeting", &"hello");
        store.set("count", &42u32);

        let reopened = SettingsStore::open_at(&path);
        assert_eq!(reopened.get::<String>("greeting").unwrap(), "hello");
        assert_eq!(reopened.get::<u32>("count").unwrap(), 42);
    }

    #[test]
    fn test_type_mismatch_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::open_at(dir.path().join("settings.json"));
        store.set("key", &"not a number");
        assert!(store.get::<u32>("key").is_none());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::open_at(&path);
        store.set("key", &1u8);
        store.remove("key");
        assert!(store.get::<u8>("key").is_none());
        assert!(SettingsStore::open_at(&path).get::<u8>("key").is_none());
    }

    #[test]
    fn test_corrupt_file_starts_fresh_but_stays_writable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{{{ not json").unwrap();

        let mut store = SettingsStore::open_at(&path);
        assert!(store.is_available());
        store.set("key", &true);
        assert_eq!(SettingsStore::open_at(&path).get::<bool>("key"), Some(true));
    }

    #[test]
    fn test_parent_dir_created_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("settings.json");
        let mut store = SettingsStore::open_at(&path);
        store.set("key", &"value");
        assert!(path.exists());
    }
}
