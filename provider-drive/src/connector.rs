//! Export API connector implementation
//!
//! Implements the `ExportProvider` trait over the bridge `HttpClient`.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::export::{ExportProvider, ExportSnapshot, RemoteArchive};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use bytes::Bytes;
use core_runtime::config::DriveApiConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::DriveError;
use crate::types::ExportResponse;

/// Creation request body: `{"archivePrefix": ..., "items": [{"id": ...}]}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateExportRequest<'a> {
    archive_prefix: &'a str,
    items: Vec<ExportItem<'a>>,
}

#[derive(Debug, Serialize)]
struct ExportItem<'a> {
    id: &'a str,
}

/// Export API connector
///
/// Implements [`ExportProvider`] for the hosting service's export API.
///
/// # Features
///
/// - Export creation and polling with the required `Referer` header
/// - Folder display-name resolution from the embedded folder view page
/// - Single-attempt polling (`RetryPolicy::none`) so a failed poll reaches
///   the job state machine instead of being retried here
///
/// # Example
///
/// ```ignore
/// use provider_drive::DriveExportConnector;
/// use bridge_traits::export::ExportProvider;
///
/// let connector = DriveExportConnector::new(http_client, config);
/// let snapshot = connector.create_export("folder-key", "My Song").await?;
/// ```
pub struct DriveExportConnector {
    /// HTTP client for API requests
    http: Arc<dyn HttpClient>,

    /// Endpoints, key, and referer
    config: DriveApiConfig,
}

impl DriveExportConnector {
    /// Create a new connector
    pub fn new(http: Arc<dyn HttpClient>, config: DriveApiConfig) -> Self {
        Self { http, config }
    }

    fn creation_url(&self) -> String {
        format!(
            "{}/exports?key={}",
            self.config.export_base,
            urlencoding::encode(&self.config.api_key)
        )
    }

    fn poll_url(&self, job_id: &str) -> String {
        format!(
            "{}/exports/{}?key={}",
            self.config.export_base,
            urlencoding::encode(job_id),
            urlencoding::encode(&self.config.api_key)
        )
    }

    fn embed_url(&self, folder_key: &str) -> String {
        format!(
            "{}?id={}",
            self.config.embed_base,
            urlencoding::encode(folder_key)
        )
    }

    fn parse_snapshot(body: &[u8]) -> std::result::Result<ExportSnapshot, DriveError> {
        let response: ExportResponse = serde_json::from_slice(body)
            .map_err(|e| DriveError::ParseError(e.to_string()))?;
        Ok(response.into_snapshot())
    }
}

/// Decode the small set of HTML entities the folder view emits in titles.
pub(crate) fn decode_html_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Extract the content of the first `<title>` element, case-insensitively.
pub(crate) fn extract_title(html: &str) -> Option<&str> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title>")?;
    let content_start = open + "<title>".len();
    let close = lower[content_start..].find("</title>")?;
    let content = html[content_start..content_start + close].trim();
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

#[async_trait]
impl ExportProvider for DriveExportConnector {
    #[instrument(skip(self))]
    async fn resolve_display_name(&self, folder_key: &str) -> Result<String> {
        let request = HttpRequest::new(HttpMethod::Get, self.embed_url(folder_key))
            .accept("text/html")
            .referer(&self.config.referer);

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Folder page fetch failed");
            return Err(response.into_error());
        }

        let html = response.text()?;
        let title = extract_title(&html).ok_or_else(|| {
            BridgeError::from(DriveError::TitleNotFound {
                folder_id: folder_key.to_string(),
            })
        })?;

        let name = decode_html_entities(title);
        debug!(name = %name, "Resolved folder display name");
        Ok(name)
    }

    #[instrument(skip(self), fields(folder_key = %folder_key))]
    async fn create_export(
        &self,
        folder_key: &str,
        archive_prefix: &str,
    ) -> Result<ExportSnapshot> {
        info!("Creating export job");

        let body = CreateExportRequest {
            archive_prefix,
            items: vec![ExportItem { id: folder_key }],
        };

        let request = HttpRequest::new(HttpMethod::Post, self.creation_url())
            .referer(&self.config.referer)
            .json(&body)?;

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Export creation failed");
            return Err(response.into_error());
        }

        let snapshot = Self::parse_snapshot(&response.body)?;
        info!(job_id = %snapshot.id, status = %snapshot.status, "Export job created");
        Ok(snapshot)
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn poll_export(&self, job_id: &str) -> Result<ExportSnapshot> {
        let request = HttpRequest::new(HttpMethod::Get, self.poll_url(job_id))
            .referer(&self.config.referer);

        // One attempt only: the job loop owns failure handling for polls.
        let response = self
            .http
            .execute_with_retry(request, RetryPolicy::none())
            .await?;
        if !response.is_success() {
            warn!(status = response.status, "Export poll failed");
            return Err(response.into_error());
        }

        let snapshot = Self::parse_snapshot(&response.body)?;
        debug!(status = %snapshot.status, percent = ?snapshot.percent_done, "Export poll");
        Ok(snapshot)
    }

    #[instrument(skip(self, archive), fields(file_name = %archive.file_name))]
    async fn fetch_archive(&self, archive: &RemoteArchive) -> Result<Bytes> {
        info!("Fetching archive");

        let request = HttpRequest::new(HttpMethod::Get, archive.storage_path.clone());
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Archive fetch failed");
            return Err(response.into_error());
        }

        debug!(bytes = response.body.len(), "Archive fetched");
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::export::ExportStatus;
    use bridge_traits::http::HttpResponse;
    use mockall::mock;
    use mockall::predicate::function;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn execute_with_retry(
                &self,
                request: HttpRequest,
                policy: RetryPolicy,
            ) -> Result<HttpResponse>;
        }
    }

    impl std::fmt::Debug for MockHttp {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("MockHttp")
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn connector(http: MockHttp) -> DriveExportConnector {
        DriveExportConnector::new(Arc::new(http), DriveApiConfig::default())
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(
            decode_html_entities("Rock &amp; Roll &#39;99&quot; &lt;live&gt;"),
            "Rock & Roll '99\" <live>"
        );
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("<html><head><TITLE> My Folder </TITLE></head></html>"),
            Some("My Folder")
        );
        assert_eq!(extract_title("<html><body>nope</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[tokio::test]
    async fn test_create_export_sends_referer_and_parses_snapshot() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .with(function(|req: &HttpRequest| {
                req.method == HttpMethod::Post
                    && req.url.contains("/exports?key=")
                    && req.headers.get("Referer").map(String::as_str)
                        == Some("https://drive.google.com/")
                    && req.headers.get("Content-Type").map(String::as_str)
                        == Some("application/json")
            }))
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"exportJob": {"id": "job-1", "status": "QUEUED"}}"#,
                ))
            });

        let snapshot = connector(http)
            .create_export("folder-1", "My Song")
            .await
            .unwrap();

        assert_eq!(snapshot.id, "job-1");
        assert_eq!(snapshot.status, ExportStatus::Queued);
    }

    #[tokio::test]
    async fn test_create_export_propagates_http_status() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Ok(response(500, "server exploded")));

        let err = connector(http)
            .create_export("folder-1", "My Song")
            .await
            .unwrap_err();

        match err {
            BridgeError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "server exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_uses_single_attempt_policy() {
        let mut http = MockHttp::new();
        http.expect_execute_with_retry()
            .withf(|req, policy| {
                req.url.contains("/exports/job-1?key=") && policy.max_attempts == 1
            })
            .times(1)
            .returning(|_, _| {
                Ok(response(
                    200,
                    r#"{"exportJob": {"id": "job-1", "status": "IN_PROGRESS"}, "percentDone": 10.0}"#,
                ))
            });

        let snapshot = connector(http).poll_export("job-1").await.unwrap();
        assert_eq!(snapshot.status, ExportStatus::InProgress);
        assert_eq!(snapshot.percent_done, Some(10.0));
    }

    #[tokio::test]
    async fn test_resolve_display_name_decodes_entities() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req: &HttpRequest| {
                req.url.starts_with("https://drive.google.com/embeddedfolderview?id=")
                    && req.headers.get("Accept").map(String::as_str) == Some("text/html")
            })
            .returning(|_| {
                Ok(response(
                    200,
                    "<html><head><title>Beats &amp; Pieces</title></head></html>",
                ))
            });

        let name = connector(http)
            .resolve_display_name("folder-1")
            .await
            .unwrap();
        assert_eq!(name, "Beats & Pieces");
    }

    #[tokio::test]
    async fn test_resolve_display_name_without_title_fails() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Ok(response(200, "<html><body>empty</body></html>")));

        let err = connector(http)
            .resolve_display_name("folder-1")
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_archive_returns_body() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req: &HttpRequest| req.url == "https://example.com/download/1")
            .returning(|_| Ok(response(200, "zip-bytes")));

        let archive = RemoteArchive {
            file_name: "a.zip".to_string(),
            storage_path: "https://example.com/download/1".to_string(),
            compressed_size: None,
            size_of_contents: None,
        };

        let bytes = connector(http).fetch_archive(&archive).await.unwrap();
        assert_eq!(&bytes[..], b"zip-bytes");
    }
}
