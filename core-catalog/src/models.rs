//! Catalog data model.

use serde::{Deserialize, Serialize};

/// One entry of the bundled song catalog.
///
/// `folder_id` is the hosting-service folder key and doubles as the request
/// key throughout the download pipeline. The romanized fields and community
/// names exist for search on the host side and ride along untouched here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Hosting-service folder key for this song's chart archive
    pub folder_id: String,

    /// Stable catalog identifier
    #[serde(default)]
    pub song_id: Option<String>,

    /// Display title; also the basis of the local archive file name
    pub title: String,

    /// Display artist
    #[serde(default)]
    pub artist: Option<String>,

    /// Romanized title for latin-script search
    #[serde(default)]
    pub romanized_title: Option<String>,

    /// Romanized artist for latin-script search
    #[serde(default)]
    pub romanized_artist: Option<String>,

    /// Alternative names the community knows the song by
    #[serde(default)]
    pub community_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_deserializes_bundled_field_names() {
        let json = r#"{
            "folderId": "1a2b3c",
            "songId": "song-001",
            "title": "Example Song",
            "artist": "Example Artist",
            "romanizedTitle": "Example Song",
            "communityNames": ["exsong"]
        }"#;

        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.folder_id, "1a2b3c");
        assert_eq!(song.song_id.as_deref(), Some("song-001"));
        assert_eq!(song.community_names, vec!["exsong".to_string()]);
        assert!(song.romanized_artist.is_none());
    }

    #[test]
    fn test_song_minimal_fields() {
        let json = r#"{"folderId": "x", "title": "T"}"#;
        let song: Song = serde_json::from_str(json).unwrap();
        assert!(song.artist.is_none());
        assert!(song.community_names.is_empty());
    }
}
