//! In-process fake of the scanning backend, served with axum on an ephemeral
//! port. Scans advance one step per status request.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portmaster::types::ScanRequest;
use serde_json::{json, Value};
use tokio::sync::RwLock;

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n% fake report\n";

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<RwLock<BackendState>>,
}

#[derive(Default)]
struct BackendState {
    /// Status requests a new scan answers with `running` before completing.
    polls_to_finish: u32,
    /// Status requests to fail with 500 before answering normally.
    flaky_polls: u32,
    /// Status requests to answer with 200 and a non-JSON body.
    garbled_polls: u32,
    /// Status requests a new scan answers with 404, as the backend does
    /// until its worker has registered the scan.
    unregistered_polls: u32,
    fail_history: bool,
    next_seq: u64,
    order: Vec<String>,
    scans: HashMap<String, FakeScan>,
    requests: Vec<ScanRequest>,
}

struct FakeScan {
    target: String,
    algorithm: String,
    start_time: String,
    status: String,
    total_ports: u64,
    polls: u32,
    polls_to_finish: u32,
    unregistered_polls: u32,
    open_ports: Vec<Value>,
}

impl FakeScan {
    fn snapshot(&self) -> Value {
        let progress = if self.status == "running" && self.polls_to_finish > 0 {
            self.total_ports * u64::from(self.polls) / u64::from(self.polls_to_finish + 1)
        } else {
            self.total_ports
        };
        let mut v = json!({
            "target": self.target,
            "algorithm": self.algorithm,
            "common_ports_first": true,
            "start_time": self.start_time,
            "start_timestamp": 1717230000.0,
            "open_ports": self.open_ports,
            "progress": progress,
            "total_ports": self.total_ports,
            "status": self.status,
        });
        if self.status != "running" {
            v["end_time"] = json!("2024-06-01 09:31:05");
            v["elapsed_time"] = json!("65.00");
        }
        v
    }
}

/// Ports every fake scan reports, deliberately not in risk order.
pub fn sample_open_ports() -> Vec<Value> {
    vec![
        json!({"port": 443, "service": "https", "risk_level": "Low",
               "risk_description": "Encrypted.", "recommendations": "Keep TLS current."}),
        json!({"port": 9999, "service": "unknown", "risk_level": "Unknown"}),
        json!({"port": 23, "service": "telnet", "risk_level": "Critical",
               "risk_description": "Cleartext.", "recommendations": "Use SSH."}),
        json!({"port": 22, "service": "ssh", "risk_level": "Medium"}),
        json!({"port": 80, "service": "http", "risk_level": "High"}),
    ]
}

impl FakeBackend {
    pub fn new(polls_to_finish: u32) -> Self {
        let backend = Self::default();
        backend
            .inner
            .try_write()
            .expect("fresh lock")
            .polls_to_finish = polls_to_finish;
        backend
    }

    pub async fn set_flaky_polls(&self, n: u32) {
        self.inner.write().await.flaky_polls = n;
    }

    pub async fn set_garbled_polls(&self, n: u32) {
        self.inner.write().await.garbled_polls = n;
    }

    pub async fn set_unregistered_polls(&self, n: u32) {
        self.inner.write().await.unregistered_polls = n;
    }

    pub async fn set_fail_history(&self, fail: bool) {
        self.inner.write().await.fail_history = fail;
    }

    /// Insert a scan directly, as if started earlier.
    pub async fn seed(&self, scan_id: &str, start_time: &str, status: &str) {
        let mut s = self.inner.write().await;
        s.order.push(scan_id.to_string());
        s.scans.insert(
            scan_id.to_string(),
            FakeScan {
                target: scan_id.split('_').next().unwrap_or(scan_id).to_string(),
                algorithm: "BFS".into(),
                start_time: start_time.into(),
                status: status.into(),
                total_ports: 1024,
                polls: 0,
                polls_to_finish: 2,
                unregistered_polls: 0,
                open_ports: sample_open_ports(),
            },
        );
    }

    pub async fn polls(&self, scan_id: &str) -> u32 {
        self.inner
            .read()
            .await
            .scans
            .get(scan_id)
            .map(|s| s.polls)
            .unwrap_or(0)
    }

    pub async fn requests(&self) -> Vec<ScanRequest> {
        self.inner.read().await.requests.clone()
    }

    /// Serve on 127.0.0.1 with an ephemeral port; returns the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/scan", post(post_scan))
            .route("/api/scan/{id}", get(get_scan))
            .route("/api/scan/{id}/export/pdf", get(export_pdf))
            .route("/api/scans", get(list_scans))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend");
        });
        format!("http://{addr}")
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Scan not found"}))).into_response()
}

async fn post_scan(State(app): State<FakeBackend>, Json(req): Json<ScanRequest>) -> Response {
    let mut s = app.inner.write().await;
    s.next_seq += 1;
    let scan_id = format!("{}_{}", req.target, 1717230000 + s.next_seq);
    let scan = FakeScan {
        target: req.target.clone(),
        algorithm: serde_json::to_value(req.algorithm)
            .ok()
            .and_then(|v| v.as_str().map(str::to_uppercase))
            .unwrap_or_default(),
        start_time: "2024-06-01 09:30:00".into(),
        status: "running".into(),
        total_ports: u64::from(req.port_range_end - req.port_range_start) + 1,
        polls: 0,
        polls_to_finish: s.polls_to_finish,
        unregistered_polls: s.unregistered_polls,
        open_ports: sample_open_ports(),
    };
    s.order.push(scan_id.clone());
    s.scans.insert(scan_id.clone(), scan);
    let target = req.target.clone();
    s.requests.push(req);
    Json(json!({"scan_id": scan_id, "status": "started", "target": target})).into_response()
}

async fn get_scan(State(app): State<FakeBackend>, Path(id): Path<String>) -> Response {
    let mut s = app.inner.write().await;
    if !s.scans.contains_key(&id) {
        return not_found();
    }
    if let Some(scan) = s.scans.get_mut(&id) {
        if scan.unregistered_polls > 0 {
            scan.unregistered_polls -= 1;
            return not_found();
        }
    }
    if s.garbled_polls > 0 {
        s.garbled_polls -= 1;
        return (
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>502 Bad Gateway</body></html>",
        )
            .into_response();
    }
    if s.flaky_polls > 0 {
        s.flaky_polls -= 1;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "backend hiccup"})),
        )
            .into_response();
    }
    let Some(scan) = s.scans.get_mut(&id) else {
        return not_found();
    };
    scan.polls += 1;
    if scan.status == "running" && scan.polls > scan.polls_to_finish {
        scan.status = "completed".into();
    }
    Json(scan.snapshot()).into_response()
}

async fn list_scans(State(app): State<FakeBackend>) -> Response {
    let s = app.inner.read().await;
    if s.fail_history {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "history unavailable"})),
        )
            .into_response();
    }
    let entries: Vec<Value> = s
        .order
        .iter()
        .filter_map(|id| s.scans.get(id).map(|scan| (id, scan)))
        .map(|(id, scan)| {
            json!({
                "scan_id": id,
                "target": scan.target,
                "algorithm": scan.algorithm,
                "start_time": scan.start_time,
                "status": scan.status,
                "open_ports": scan.open_ports,
            })
        })
        .collect();
    Json(entries).into_response()
}

async fn export_pdf(State(app): State<FakeBackend>, Path(id): Path<String>) -> Response {
    let s = app.inner.read().await;
    if !s.scans.contains_key(&id) {
        return not_found();
    }
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=scan-{id}.pdf"),
            ),
        ],
        PDF_BYTES,
    )
        .into_response()
}
