/// Shared data types for the stored-image gallery.

/// An uploaded background image as stored in the blob table.
///
/// Ids come from SQLite's AUTOINCREMENT and are never reused, so a restored
/// image after an undo always carries a fresh id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: i64,
    pub blob: Vec<u8>,
    pub name: String,
    pub created_at: i64,
}
