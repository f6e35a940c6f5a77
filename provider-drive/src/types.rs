//! Export API response types
//!
//! Data structures for deserializing export API responses. The progress
//! fields ride at the top level next to the job body, mirroring the wire
//! format exactly.

use bridge_traits::export::{ExportSnapshot, ExportStatus, RemoteArchive};
use serde::Deserialize;

/// Export API response envelope
///
/// Returned by both the creation and polling endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    /// The job resource
    pub export_job: ExportJobBody,

    /// Progress percentage (top-level, not inside the job)
    #[serde(default)]
    pub percent_done: Option<f32>,

    /// Count of files fetched into the archive so far
    #[serde(default)]
    pub num_fetched_files: Option<u64>,
}

/// Export job resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobBody {
    /// Opaque job identifier
    pub id: String,

    /// Current status
    pub status: ExportStatus,

    /// Archives produced so far; absent until the service reports any
    #[serde(default)]
    pub archives: Option<Vec<RemoteArchive>>,
}

impl ExportResponse {
    /// Flatten the envelope into the snapshot the core works with.
    pub fn into_snapshot(self) -> ExportSnapshot {
        ExportSnapshot {
            id: self.export_job.id,
            status: self.export_job.status,
            percent_done: self.percent_done,
            num_fetched_files: self.num_fetched_files,
            archives: self.export_job.archives.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_creation_response() {
        let json = r#"{
            "exportJob": {
                "id": "export-abc123",
                "status": "QUEUED"
            }
        }"#;

        let response: ExportResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.into_snapshot();

        assert_eq!(snapshot.id, "export-abc123");
        assert_eq!(snapshot.status, ExportStatus::Queued);
        assert!(snapshot.percent_done.is_none());
        assert!(snapshot.archives.is_empty());
    }

    #[test]
    fn test_deserialize_progress_response() {
        let json = r#"{
            "exportJob": {
                "id": "export-abc123",
                "status": "IN_PROGRESS"
            },
            "percentDone": 45.0,
            "numFetchedFiles": 12
        }"#;

        let snapshot: ExportSnapshot =
            serde_json::from_str::<ExportResponse>(json).unwrap().into_snapshot();

        assert_eq!(snapshot.status, ExportStatus::InProgress);
        assert_eq!(snapshot.percent_done, Some(45.0));
        assert_eq!(snapshot.num_fetched_files, Some(12));
    }

    #[test]
    fn test_deserialize_succeeded_response_with_archives() {
        let json = r#"{
            "exportJob": {
                "id": "export-abc123",
                "status": "SUCCEEDED",
                "archives": [
                    {
                        "fileName": "My Song-001.zip",
                        "storagePath": "https://example.com/download/1",
                        "compressedSize": "1024",
                        "sizeOfContents": "4096"
                    }
                ]
            },
            "percentDone": 100.0
        }"#;

        let snapshot: ExportSnapshot =
            serde_json::from_str::<ExportResponse>(json).unwrap().into_snapshot();

        assert_eq!(snapshot.status, ExportStatus::Succeeded);
        assert_eq!(snapshot.archives.len(), 1);
        assert_eq!(snapshot.archives[0].file_name, "My Song-001.zip");
    }
}
