/// Background manager
///
/// Tracks which background is active (a remote URL or a stored blob id),
/// persists that reference, and guards against stale async completions: every
/// change bumps a generation counter, and resolutions or palette extractions
/// that finish for an older generation are dropped on arrival.
///
/// Deleting a stored image gets a short-lived in-memory undo. Undo re-inserts
/// the blob (fresh id, ids are never reused) and the caller re-runs
/// resolution and extraction for it.

use crate::palette::ExtractionError;
use crate::state::data::StoredImage;
use crate::state::library::Library;
use crate::state::settings::SettingsStore;

/// Settings key for the persisted background reference.
pub const BACKGROUND_KEY: &str = "backgroundURL";
/// Settings key for the auto-theme toggle.
pub const AUTO_THEME_KEY: &str = "autoThemeEnabled";

/// How long a deleted image stays restorable, in milliseconds.
pub const UNDO_WINDOW_MS: u64 = 6000;

/// What the start page draws behind everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundRef {
    /// A remote image by URL.
    Remote(String),
    /// An uploaded image in the blob store.
    Stored(i64),
}

impl BackgroundRef {
    /// Parse the persisted form: `db:<id>` for stored images, anything else
    /// is a remote URL. Empty strings mean no background.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(id) = raw.strip_prefix("db:") {
            return id.parse().ok().map(BackgroundRef::Stored);
        }
        Some(BackgroundRef::Remote(raw.to_string()))
    }

    /// The persisted form.
    pub fn encode(&self) -> String {
        match self {
            BackgroundRef::Remote(url) => url.clone(),
            BackgroundRef::Stored(id) => format!("db:{id}"),
        }
    }
}

/// Why a background resolution came back without bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The stored blob no longer exists; the reference is dead and should
    /// be dropped.
    Missing,
    /// The source failed for now (network, decode, store error); the
    /// reference stays and the current view is kept.
    Source(ExtractionError),
}

/// An image held for possible undo after deletion.
#[derive(Debug, Clone)]
pub struct PendingUndo {
    pub blob: Vec<u8>,
    pub name: String,
    /// Whether the deleted image was the active background when deleted.
    pub was_active: bool,
}

#[derive(Debug, Default)]
pub struct BackgroundManager {
    active: Option<BackgroundRef>,
    generation: u64,
    pending_undo: Option<PendingUndo>,
}

impl BackgroundManager {
    /// Restore the active reference from settings.
    pub fn load(settings: &SettingsStore) -> Self {
        let active = settings
            .get::<String>(BACKGROUND_KEY)
            .and_then(|raw| BackgroundRef::parse(&raw));
        Self {
            active,
            generation: 0,
            pending_undo: None,
        }
    }

    pub fn active(&self) -> Option<&BackgroundRef> {
        self.active.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Make a reference active, persist it, and return the generation its
    /// resolution must carry to be accepted.
    pub fn set_reference(&mut self, reference: BackgroundRef, settings: &mut SettingsStore) -> u64 {
        settings.set(BACKGROUND_KEY, &reference.encode());
        self.active = Some(reference);
        self.generation += 1;
        self.generation
    }

    /// Remove the background entirely.
    pub fn clear(&mut self, settings: &mut SettingsStore) {
        settings.remove(BACKGROUND_KEY);
        self.active = None;
        self.generation += 1;
    }

    /// Whether an async completion tagged with `generation` is still the
    /// one we are waiting for.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Delete a stored image from the gallery, holding it for undo.
    ///
    /// If the deleted image was the active background the reference is
    /// cleared too. Returns false when the id does not exist.
    pub fn delete_stored(
        &mut self,
        id: i64,
        library: &Library,
        settings: &mut SettingsStore,
    ) -> rusqlite::Result<bool> {
        let Some(image) = library.get_image(id)? else {
            return Ok(false);
        };
        if !library.delete_image(id)? {
            return Ok(false);
        }

        let was_active = self.active == Some(BackgroundRef::Stored(id));
        if was_active {
            self.clear(settings);
        }

        self.pending_undo = Some(PendingUndo {
            blob: image.blob,
            name: image.name,
            was_active,
        });
        Ok(true)
    }

    pub fn has_pending_undo(&self) -> bool {
        self.pending_undo.is_some()
    }

    /// The undo window elapsed; the deletion is final.
    pub fn expire_undo(&mut self) {
        self.pending_undo = None;
    }

    /// Restore the most recently deleted image under a fresh id.
    ///
    /// When the deleted image was the active background it becomes active
    /// again; the caller then re-resolves (and re-extracts) for the returned
    /// generation. Returns the restored image and, if reactivated, the new
    /// generation.
    pub fn undo_delete(
        &mut self,
        library: &Library,
        settings: &mut SettingsStore,
    ) -> rusqlite::Result<Option<(StoredImage, Option<u64>)>> {
        let Some(pending) = self.pending_undo.take() else {
            return Ok(None);
        };

        let id = library.add_image(&pending.blob, &pending.name)?;
        let Some(restored) = library.get_image(id)? else {
            return Ok(None);
        };

        let generation = if pending.was_active {
            Some(self.set_reference(BackgroundRef::Stored(id), settings))
        } else {
            None
        };

        Ok(Some((restored, generation)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, SettingsStore, Library) {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::open_at(dir.path().join("settings.json"));
        let library = Library::open_in_memory().unwrap();
        (dir, settings, library)
    }

    #[test]
    fn test_reference_round_trip() {
        assert_eq!(
            BackgroundRef::parse("db:42"),
            Some(BackgroundRef::Stored(42))
        );
        assert_eq!(
            BackgroundRef::parse("https://example.com/bg.jpg"),
            Some(BackgroundRef::Remote("https://example.com/bg.jpg".into()))
        );
        assert_eq!(BackgroundRef::parse(""), None);
        assert_eq!(BackgroundRef::parse("db:not-a-number"), None);

        let r = BackgroundRef::Stored(7);
        assert_eq!(BackgroundRef::parse(&r.encode()), Some(r));
    }

    #[test]
    fn test_set_reference_persists_and_bumps_generation() {
        let (_dir, mut settings, _lib) = scratch();
        let mut mgr = BackgroundManager::default();

        let gen1 = mgr.set_reference(BackgroundRef::Stored(1), &mut settings);
        let gen2 = mgr.set_reference(
            BackgroundRef::Remote("https://example.com/a.png".into()),
            &mut settings,
        );
        assert!(gen2 > gen1);
        assert_eq!(
            settings.get::<String>(BACKGROUND_KEY).unwrap(),
            "https://example.com/a.png"
        );

        // The older resolution is stale now.
        assert!(!mgr.is_current(gen1));
        assert!(mgr.is_current(gen2));
    }

    #[test]
    fn test_load_restores_active_reference() {
        let (_dir, mut settings, _lib) = scratch();
        settings.set(BACKGROUND_KEY, &"db:9");
        let mgr = BackgroundManager::load(&settings);
        assert_eq!(mgr.active(), Some(&BackgroundRef::Stored(9)));
    }

    #[test]
    fn test_deleting_active_background_clears_reference() {
        let (_dir, mut settings, lib) = scratch();
        let id = lib.add_image(&[1, 2], "bg.png").unwrap();

        let mut mgr = BackgroundManager::default();
        mgr.set_reference(BackgroundRef::Stored(id), &mut settings);

        assert!(mgr.delete_stored(id, &lib, &mut settings).unwrap());
        assert!(mgr.active().is_none());
        assert!(settings.get::<String>(BACKGROUND_KEY).is_none());
        assert!(mgr.has_pending_undo());
    }

    #[test]
    fn test_deleting_inactive_image_keeps_reference() {
        let (_dir, mut settings, lib) = scratch();
        let keep = lib.add_image(&[1], "keep.png").unwrap();
        let drop = lib.add_image(&[2], "drop.png").unwrap();

        let mut mgr = BackgroundManager::default();
        mgr.set_reference(BackgroundRef::Stored(keep), &mut settings);

        assert!(mgr.delete_stored(drop, &lib, &mut settings).unwrap());
        assert_eq!(mgr.active(), Some(&BackgroundRef::Stored(keep)));
    }

    #[test]
    fn test_undo_restores_under_fresh_id_and_reactivates() {
        let (_dir, mut settings, lib) = scratch();
        let id = lib.add_image(&[5, 5, 5], "bg.png").unwrap();

        let mut mgr = BackgroundManager::default();
        mgr.set_reference(BackgroundRef::Stored(id), &mut settings);
        mgr.delete_stored(id, &lib, &mut settings).unwrap();

        let (restored, generation) = mgr.undo_delete(&lib, &mut settings).unwrap().unwrap();
        assert_ne!(restored.id, id);
        assert_eq!(restored.blob, vec![5, 5, 5]);
        assert!(generation.is_some());
        assert_eq!(mgr.active(), Some(&BackgroundRef::Stored(restored.id)));
        assert_eq!(
            settings.get::<String>(BACKGROUND_KEY).unwrap(),
            format!("db:{}", restored.id)
        );

        // One shot only.
        assert!(mgr.undo_delete(&lib, &mut settings).unwrap().is_none());
    }

    #[test]
    fn test_undo_of_inactive_image_does_not_change_background() {
        let (_dir, mut settings, lib) = scratch();
        let keep = lib.add_image(&[1], "keep.png").unwrap();
        let drop = lib.add_image(&[2], "drop.png").unwrap();

        let mut mgr = BackgroundManager::default();
        mgr.set_reference(BackgroundRef::Stored(keep), &mut settings);
        mgr.delete_stored(drop, &lib, &mut settings).unwrap();

        let (_, generation) = mgr.undo_delete(&lib, &mut settings).unwrap().unwrap();
        assert!(generation.is_none());
        assert_eq!(mgr.active(), Some(&BackgroundRef::Stored(keep)));
    }

    #[test]
    fn test_expired_undo_is_gone() {
        let (_dir, mut settings, lib) = scratch();
        let id = lib.add_image(&[1], "bg.png").unwrap();
        let mut mgr = BackgroundManager::default();
        mgr.delete_stored(id, &lib, &mut settings).unwrap();
        mgr.expire_undo();
        assert!(mgr.undo_delete(&lib, &mut settings).unwrap().is_none());
    }

    #[test]
    fn test_clear_bumps_generation() {
        let (_dir, mut settings, _lib) = scratch();
        let mut mgr = BackgroundManager::default();
        let gen = mgr.set_reference(BackgroundRef::Stored(1), &mut settings);
        mgr.clear(&mut settings);
        assert!(!mgr.is_current(gen));
    }
}
