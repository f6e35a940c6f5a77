//! Catalog loading and lookup.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::models::Song;

/// In-memory song catalog with folder-key lookup.
///
/// The catalog is loaded once at startup from the bundled JSON file and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    songs: Vec<Song>,
    by_folder: HashMap<String, usize>,
}

impl Catalog {
    /// Parse a catalog from the bundled JSON contents.
    ///
    /// Duplicate folder keys keep the first occurrence; later duplicates are
    /// logged and still listed, they just lose lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed JSON and
    /// [`CatalogError::Empty`] when the file contains no songs.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_songs(serde_json::from_str(json)?)
    }

    /// Parse a catalog from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_songs(serde_json::from_slice(bytes)?)
    }

    fn from_songs(songs: Vec<Song>) -> Result<Self> {
        if songs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_folder = HashMap::with_capacity(songs.len());
        for (index, song) in songs.iter().enumerate() {
            if by_folder.contains_key(&song.folder_id) {
                warn!(folder_id = %song.folder_id, title = %song.title, "Duplicate folder key in catalog");
                continue;
            }
            by_folder.insert(song.folder_id.clone(), index);
        }

        debug!(count = songs.len(), "Catalog loaded");
        Ok(Self { songs, by_folder })
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Iterate all songs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }

    /// Look up a song by its folder key.
    pub fn find_by_folder_id(&self, folder_id: &str) -> Option<&Song> {
        self.by_folder.get(folder_id).map(|&i| &self.songs[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"folderId": "f1", "title": "First Song", "artist": "A"},
        {"folderId": "f2", "title": "Second Song"},
        {"folderId": "f1", "title": "Shadowed Duplicate"}
    ]"#;

    #[test]
    fn test_load_and_lookup() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);

        let song = catalog.find_by_folder_id("f2").unwrap();
        assert_eq!(song.title, "Second Song");
        assert!(catalog.find_by_folder_id("missing").is_none());
    }

    #[test]
    fn test_duplicate_folder_keys_first_wins() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let song = catalog.find_by_folder_id("f1").unwrap();
        assert_eq!(song.title, "First Song");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            Catalog::from_json_str("[]"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
