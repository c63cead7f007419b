//! HTTP access to the scanning backend.
//!
//! [`ScanApi`] is the seam the poller and session are written against;
//! [`HttpScanClient`] implements it over reqwest.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{ApiErrorBody, ScanRequest, ScanSnapshot, ScanStarted, ScanSummary};

/// The four backend operations the client relies on.
#[async_trait]
pub trait ScanApi: Send + Sync {
    /// `POST /api/scan`
    async fn start_scan(&self, request: &ScanRequest) -> Result<ScanStarted>;

    /// `GET /api/scan/{id}`
    async fn get_scan(&self, scan_id: &str) -> Result<ScanSnapshot>;

    /// `GET /api/scans`, in backend order.
    async fn list_scans(&self) -> Result<Vec<ScanSummary>>;

    /// `GET /api/scan/{id}/export/pdf`
    async fn export_pdf(&self, scan_id: &str) -> Result<PdfReport>;
}

/// A downloaded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PdfReport {
    /// Write the report into `dir` under its own filename.
    pub async fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let destination = dir.join(&self.filename);
        tokio::fs::write(&destination, &self.bytes).await?;
        Ok(destination)
    }
}

pub struct HttpScanClient {
    client: Client,
    base_url: Url,
}

impl HttpScanClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("portmaster/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ScanApi for HttpScanClient {
    async fn start_scan(&self, request: &ScanRequest) -> Result<ScanStarted> {
        let url = self.endpoint(&["api", "scan"])?;
        debug!(%url, target = %request.target, "submitting scan");
        let response = self.client.post(url).json(request).send().await?;
        let response = check_status(response, None).await?;
        Ok(response.json().await?)
    }

    async fn get_scan(&self, scan_id: &str) -> Result<ScanSnapshot> {
        let url = self.endpoint(&["api", "scan", scan_id])?;
        debug!(%url, "fetching scan");
        let response = self.client.get(url).send().await?;
        let response = check_status(response, Some(scan_id)).await?;
        let mut snapshot: ScanSnapshot = response.json().await?;
        if snapshot.scan_id.is_none() {
            snapshot.scan_id = Some(scan_id.to_string());
        }
        Ok(snapshot)
    }

    async fn list_scans(&self) -> Result<Vec<ScanSummary>> {
        let url = self.endpoint(&["api", "scans"])?;
        debug!(%url, "fetching history");
        let response = self.client.get(url).send().await?;
        let response = check_status(response, None).await?;
        Ok(response.json().await?)
    }

    async fn export_pdf(&self, scan_id: &str) -> Result<PdfReport> {
        let url = self.endpoint(&["api", "scan", scan_id, "export", "pdf"])?;
        debug!(%url, "downloading report");
        let response = self.client.get(url).send().await?;
        let response = check_status(response, Some(scan_id)).await?;
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| default_report_filename(scan_id));
        let bytes = response.bytes().await?.to_vec();
        Ok(PdfReport { filename, bytes })
    }
}

/// Map non-success responses to errors. A 404 on a scan-scoped endpoint is
/// `NotFound`; other failures carry the backend's `error` message when the
/// body has one.
async fn check_status(response: Response, scan_id: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, scan_id) {
        return Err(ClientError::NotFound {
            scan_id: id.to_string(),
        });
    }
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) if text.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => text,
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extract `filename=` from a Content-Disposition value.
pub fn attachment_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| value.trim().trim_matches('"'))
        })
        .and_then(sanitize_filename)
}

pub fn default_report_filename(scan_id: &str) -> String {
    format!("scan-{}.pdf", scan_id.replace(['/', '\\'], "_"))
}

/// Keep only the final path component so a download never escapes its
/// directory.
fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}
