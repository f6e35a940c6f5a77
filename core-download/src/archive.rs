//! Batch Archive Recombination
//!
//! A batch handoff delivers one archive. Each completed download is itself a
//! zip-compatible archive, so a batch of N songs is recombined into a single
//! archive holding the union of their entries. Entries are copied raw
//! (still compressed), so nothing is inflated or re-deflated.

use bytes::Bytes;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{debug, warn};
use zip::read::ZipArchive;
use zip::write::ZipWriter;

use crate::error::{DownloadError, Result};

/// Merge several song archives into one batch archive.
///
/// Entry names collide only when two songs ship an identically named chart
/// folder; the first occurrence wins and later duplicates are dropped with
/// a warning.
///
/// # Errors
///
/// Returns [`DownloadError::Archive`] when a source is not a readable zip
/// or the merged archive cannot be written.
pub fn merge_archives(sources: &[Bytes]) -> Result<Bytes> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut seen: HashSet<String> = HashSet::new();

    for (index, source) in sources.iter().enumerate() {
        let mut archive = ZipArchive::new(Cursor::new(source.as_ref()))
            .map_err(|e| DownloadError::Archive(format!("source {index}: {e}")))?;

        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| DownloadError::Archive(format!("source {index} entry {i}: {e}")))?;

            if !seen.insert(entry.name().to_string()) {
                warn!(entry = entry.name(), "Duplicate entry across batch archives, keeping first");
                continue;
            }

            writer
                .raw_copy_file(entry)
                .map_err(|e| DownloadError::Archive(format!("copy from source {index}: {e}")))?;
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| DownloadError::Archive(e.to_string()))?;

    let merged = Bytes::from(cursor.into_inner());
    debug!(sources = sources.len(), bytes = merged.len(), "Batch archive assembled");
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn zip_with(entries: &[(&str, &[u8])]) -> Bytes {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    fn entry_names(bytes: &Bytes) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes.as_ref())).unwrap();
        archive.file_names().map(String::from).collect()
    }

    fn read_entry(bytes: &Bytes, name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_ref())).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut out).unwrap();
        out
    }

    #[test]
    fn test_merge_is_union_of_entries() {
        let a = zip_with(&[("song-a/chart.json", b"a-chart"), ("song-a/track.mp3", b"a-track")]);
        let b = zip_with(&[("song-b/chart.json", b"b-chart")]);

        let merged = merge_archives(&[a, b]).unwrap();

        let mut names = entry_names(&merged);
        names.sort();
        assert_eq!(
            names,
            vec![
                "song-a/chart.json".to_string(),
                "song-a/track.mp3".to_string(),
                "song-b/chart.json".to_string(),
            ]
        );
        assert_eq!(read_entry(&merged, "song-b/chart.json"), b"b-chart");
    }

    #[test]
    fn test_duplicate_entries_keep_first() {
        let a = zip_with(&[("shared/readme.txt", b"from-a")]);
        let b = zip_with(&[("shared/readme.txt", b"from-b"), ("b-only.txt", b"b")]);

        let merged = merge_archives(&[a, b]).unwrap();

        assert_eq!(entry_names(&merged).len(), 2);
        assert_eq!(read_entry(&merged, "shared/readme.txt"), b"from-a");
    }

    #[test]
    fn test_garbage_source_is_rejected() {
        let err = merge_archives(&[Bytes::from_static(b"not a zip")]).unwrap_err();
        assert!(matches!(err, DownloadError::Archive(_)));
    }

    #[test]
    fn test_empty_source_list_yields_empty_archive() {
        let merged = merge_archives(&[]).unwrap();
        assert!(entry_names(&merged).is_empty());
    }
}
