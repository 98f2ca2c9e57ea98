/// Settings import/export.
///
/// Export writes a single JSON object: the bookmarks array plus a whitelist
/// of appearance and widget settings. Import reads such an object back,
/// applies every key it knows and silently ignores the rest; the caller then
/// reloads all state so every component sees the imported values.

use chrono::{DateTime, Utc};

use crate::bookmarks::BOOKMARKS_KEY;
use crate::state::settings::SettingsStore;

/// Settings keys that travel in an export, besides the bookmarks array.
pub const EXPORT_KEYS: &[&str] = &[
    "selectedTheme",
    "customTheme",
    "backgroundURL",
    "greetings",
    "weatherLocation",
    "autoThemeEnabled",
    "derivedTheme",
];

/// Build the export object from current settings. Keys with no stored value
/// are simply absent.
pub fn export_settings(settings: &SettingsStore) -> serde_json::Value {
    let mut object = serde_json::Map::new();

    if let Some(bookmarks) = settings.raw(BOOKMARKS_KEY) {
        object.insert(BOOKMARKS_KEY.to_string(), bookmarks.clone());
    }
    for key in EXPORT_KEYS {
        if let Some(value) = settings.raw(key) {
            object.insert((*key).to_string(), value.clone());
        }
    }

    serde_json::Value::Object(object)
}

/// `startpage-export-YYYY-MM-DD.json` for the given moment.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("startpage-export-{}.json", now.format("%Y-%m-%d"))
}

/// Apply an imported JSON document. Returns how many known keys were
/// applied, or an error message when the document isn't a JSON object.
///
/// After a successful import the caller must rebuild all in-memory state
/// from the store.
pub fn apply_imported(raw: &str, settings: &mut SettingsStore) -> Result<usize, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("not valid JSON: {e}"))?;
    let Some(object) = value.as_object() else {
        return Err("import file must contain a JSON object".to_string());
    };

    let mut applied = 0;
    for (key, value) in object {
        let known = key == BOOKMARKS_KEY || EXPORT_KEYS.contains(&key.as_str());
        if known {
            settings.set_raw(key, value.clone());
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::{self, Bookmark};
    use chrono::TimeZone;

    fn scratch() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_at(dir.path().join("settings.json"));
        (dir, store)
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let (_dir, mut source) = scratch();
        bookmarks::save(
            &mut source,
            &[Bookmark { name: "Example".into(), url: "https://example.com".into() }],
        );
        source.set("selectedTheme", &"solarized");
        source.set("autoThemeEnabled", &true);
        source.set("greetings", &serde_json::json!({
            "morning": "Good morning",
            "afternoon": "Good afternoon",
            "evening": "Good evening"
        }));

        let exported = serde_json::to_string(&export_settings(&source)).unwrap();

        let (_dir2, mut target) = scratch();
        let applied = apply_imported(&exported, &mut target).unwrap();
        assert_eq!(applied, 4);
        assert_eq!(bookmarks::load(&target), bookmarks::load(&source));
        assert_eq!(target.get::<String>("selectedTheme").unwrap(), "solarized");
        assert_eq!(target.get::<bool>("autoThemeEnabled"), Some(true));
    }

    #[test]
    fn test_unlisted_keys_do_not_export() {
        let (_dir, mut source) = scratch();
        source.set("todos", &serde_json::json!([{"text": "private", "completed": false}]));
        source.set("selectedTheme", &"gruvbox");

        let exported = export_settings(&source);
        assert!(exported.get("todos").is_none());
        assert!(exported.get("selectedTheme").is_some());
    }

    #[test]
    fn test_unknown_imported_keys_are_ignored() {
        let (_dir, mut target) = scratch();
        let raw = r#"{"selectedTheme": "darkOcean", "evilKey": "payload", "todos": []}"#;
        let applied = apply_imported(raw, &mut target).unwrap();
        assert_eq!(applied, 1);
        assert!(target.get::<String>("evilKey").is_none());
        assert!(target.get::<Vec<serde_json::Value>>("todos").is_none());
    }

    #[test]
    fn test_malformed_import_is_rejected() {
        let (_dir, mut target) = scratch();
        assert!(apply_imported("not json at all", &mut target).is_err());
        assert!(apply_imported("[1, 2, 3]", &mut target).is_err());
        assert!(target.get::<String>("selectedTheme").is_none());
    }

    #[test]
    fn test_export_filename_is_dated() {
        let moment = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(export_filename(moment), "startpage-export-2024-05-01.json");
    }
}
