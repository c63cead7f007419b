use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::ScanApi;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::Result;
use crate::form::ScanForm;
use crate::history::sort_newest_first;
use crate::poller::watch_scan;
use crate::risk::sort_by_risk;
use crate::types::{ScanSnapshot, ScanStatus, ScanSummary};

/// User-level flows on top of a [`ScanApi`], tracking the scan the user is
/// currently looking at.
pub struct ScanSession<A> {
    api: A,
    poll_interval: Duration,
    cancel: CancellationToken,
    current_scan: Option<String>,
}

impl<A: ScanApi> ScanSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: CancellationToken::new(),
            current_scan: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Token that aborts any watch in progress.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn current_scan(&self) -> Option<&str> {
        self.current_scan.as_deref()
    }

    /// Validate `form`, submit it and follow the scan to its end. The
    /// returned snapshot has its open ports sorted by risk.
    ///
    /// Validation failures return before any request is made, and leave the
    /// current scan unchanged.
    pub async fn start<F>(&mut self, form: &ScanForm, on_update: F) -> Result<ScanSnapshot>
    where
        F: FnMut(&ScanSnapshot),
    {
        let request = form.to_request()?;
        let started = self.api.start_scan(&request).await?;
        info!(
            scan_id = %started.scan_id,
            target = %request.target,
            range = %format!("{}-{}", request.port_range_start, request.port_range_end),
            "scan started"
        );
        self.current_scan = Some(started.scan_id.clone());
        let snapshot = watch_scan(
            &self.api,
            &started.scan_id,
            self.poll_interval,
            &self.cancel,
            on_update,
        )
        .await?;
        Ok(finalize(snapshot))
    }

    /// Open a scan picked from history. A running scan is followed until it
    /// finishes; any other status is returned as fetched.
    pub async fn open<F>(&mut self, scan_id: &str, on_update: F) -> Result<ScanSnapshot>
    where
        F: FnMut(&ScanSnapshot),
    {
        let snapshot = self.api.get_scan(scan_id).await?;
        self.current_scan = Some(scan_id.to_string());
        if snapshot.status != ScanStatus::Running {
            return Ok(finalize(snapshot));
        }
        let snapshot =
            watch_scan(&self.api, scan_id, self.poll_interval, &self.cancel, on_update).await?;
        Ok(finalize(snapshot))
    }

    /// All known scans, newest first.
    pub async fn history(&self) -> Result<Vec<ScanSummary>> {
        let mut scans = self.api.list_scans().await?;
        sort_newest_first(&mut scans);
        Ok(scans)
    }

    /// Download the current scan's report into `dir`. Does nothing when no
    /// scan has been started or opened yet.
    pub async fn export_current(&self, dir: &Path) -> Result<Option<PathBuf>> {
        match self.current_scan.as_deref() {
            Some(id) => self.export(id, dir).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn export(&self, scan_id: &str, dir: &Path) -> Result<PathBuf> {
        let report = self.api.export_pdf(scan_id).await?;
        let path = report.save_into(dir).await?;
        info!(scan_id, path = %path.display(), bytes = report.bytes.len(), "report saved");
        Ok(path)
    }
}

fn finalize(mut snapshot: ScanSnapshot) -> ScanSnapshot {
    sort_by_risk(&mut snapshot.open_ports);
    snapshot
}
