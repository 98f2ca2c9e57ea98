/// Image blob store
///
/// Uploaded background images live in a single-table SQLite database under
/// the user data dir. The connection is kept on the app state for the
/// synchronous calls the update loop makes; async tasks that need the store
/// open their own connection by path instead of sharing this one.

use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::{Path, PathBuf};

use crate::state::data::StoredImage;

pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the gallery database in the user data directory.
    pub fn open() -> Result<Self> {
        let db_path = Self::default_db_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        Self::open_at(db_path)
    }

    /// Open the gallery at an explicit path.
    pub fn open_at(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn, db_path })
    }

    /// In-memory gallery, for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn default_db_path() -> PathBuf {
        let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("startpage");
        dir.push("gallery.db");
        dir
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                blob BLOB NOT NULL,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Store an image and return its generated id.
    pub fn add_image(&self, blob: &[u8], name: &str) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO images (blob, name, created_at) VALUES (?1, ?2, ?3)",
            params![blob, name, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fetch one image by id.
    pub fn get_image(&self, id: i64) -> Result<Option<StoredImage>> {
        self.conn
            .query_row(
                "SELECT id, blob, name, created_at FROM images WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredImage {
                        id: row.get(0)?,
                        blob: row.get(1)?,
                        name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    /// All stored images, newest first.
    pub fn get_all_images(&self) -> Result<Vec<StoredImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, blob, name, created_at FROM images ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredImage {
                id: row.get(0)?,
                blob: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    /// Delete an image. Returns whether a row was removed.
    pub fn delete_image(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM images WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn image_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
    }
}

/// Read one image's bytes by database path, for tasks that cannot share the
/// UI thread's connection. `Ok(None)` means the row does not exist; `Err`
/// means the store itself failed and the row may still be there.
pub fn read_blob(db_path: &Path, id: i64) -> Result<Option<Vec<u8>>> {
    let conn = Connection::open(db_path)?;
    conn.query_row(
        "SELECT blob FROM images WHERE id = ?1",
        params![id],
        |row| row.get::<_, Vec<u8>>(0),
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_round_trip() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.add_image(&[1, 2, 3], "sunset.jpg").unwrap();
        let img = lib.get_image(id).unwrap().unwrap();
        assert_eq!(img.blob, vec![1, 2, 3]);
        assert_eq!(img.name, "sunset.jpg");
        assert_eq!(img.id, id);
    }

    #[test]
    fn test_missing_id_is_none() {
        let lib = Library::open_in_memory().unwrap();
        assert!(lib.get_image(999).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let lib = Library::open_in_memory().unwrap();
        let first = lib.add_image(&[1], "a").unwrap();
        let second = lib.add_image(&[2], "b").unwrap();
        assert!(second > first);

        // Delete the newest, then re-add: AUTOINCREMENT must not hand the
        // old id back.
        assert!(lib.delete_image(second).unwrap());
        let third = lib.add_image(&[3], "c").unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_listing_is_newest_first() {
        let lib = Library::open_in_memory().unwrap();
        let a = lib.add_image(&[1], "a").unwrap();
        let b = lib.add_image(&[2], "b").unwrap();
        let c = lib.add_image(&[3], "c").unwrap();

        let all = lib.get_all_images().unwrap();
        let ids: Vec<i64> = all.iter().map(|img| img.id).collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[test]
    fn test_delete_reports_whether_row_existed() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.add_image(&[9], "x").unwrap();
        assert!(lib.delete_image(id).unwrap());
        assert!(!lib.delete_image(id).unwrap());
        assert_eq!(lib.image_count().unwrap(), 0);
    }

    #[test]
    fn test_read_blob_missing_row_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.db");
        let lib = Library::open_at(&path).unwrap();
        let id = lib.add_image(&[4, 2], "bg.png").unwrap();

        assert_eq!(read_blob(&path, id).unwrap(), Some(vec![4, 2]));
        assert_eq!(read_blob(&path, id + 1).unwrap(), None);
    }

    #[test]
    fn test_read_blob_unopenable_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("gallery.db");
        assert!(read_blob(&path, 1).is_err());
    }

    #[test]
    fn test_open_at_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.db");
        let id = {
            let lib = Library::open_at(&path).unwrap();
            lib.add_image(&[7, 7], "keep.png").unwrap()
        };
        let lib = Library::open_at(&path).unwrap();
        assert_eq!(lib.get_image(id).unwrap().unwrap().blob, vec![7, 7]);
    }
}
