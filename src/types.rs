use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state reported by the backend for one scan.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
    /// Anything the client does not recognize, including the backend's own `unknown`.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ScanStatus {
    /// `completed` and `failed` never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
            ScanStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification attached to an open port.
///
/// Levels outside the known five are preserved verbatim in `Other` so they
/// can still be displayed; they rank after `Unknown`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
    Other(String),
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Unknown => "Unknown",
            RiskLevel::Other(s) => s,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Critical" => RiskLevel::Critical,
            "High" => RiskLevel::High,
            "Medium" => RiskLevel::Medium,
            "Low" => RiskLevel::Low,
            "Unknown" => RiskLevel::Unknown,
            _ => RiskLevel::Other(s),
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port ordering strategy requested from the backend.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Bfs,
    Dfs,
}

/// Body of `POST /api/scan`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub algorithm: Algorithm,
    pub common_ports_first: bool,
    pub max_threads: u32,
    pub port_range_start: u16,
    pub port_range_end: u16,
}

/// Response of `POST /api/scan`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanStarted {
    pub scan_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// One open port as reported by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub port: u16,
    #[serde(default = "unknown_service")]
    pub service: String,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub risk_description: Option<String>,
    #[serde(default)]
    pub recommendations: Option<String>,
}

impl PortResult {
    /// Missing levels display as `Unknown`.
    pub fn risk_label(&self) -> &str {
        self.risk_level
            .as_ref()
            .map(RiskLevel::as_str)
            .unwrap_or("Unknown")
    }
}

fn unknown_service() -> String {
    "unknown".to_string()
}

/// Wall-clock duration of a finished scan. The backend sends seconds as text
/// (`"12.34"`); plain numbers are accepted too.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Elapsed {
    Seconds(f64),
    Text(String),
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elapsed::Seconds(s) => write!(f, "{s:.2}"),
            Elapsed::Text(s) => f.write_str(s),
        }
    }
}

/// State of one scan as returned by `GET /api/scan/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ScanSnapshot {
    #[serde(default)]
    pub scan_id: Option<String>,
    pub target: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub common_ports_first: Option<bool>,
    #[serde(default)]
    pub max_threads: Option<u32>,
    #[serde(default)]
    pub port_range_start: Option<u16>,
    #[serde(default)]
    pub port_range_end: Option<u16>,
    #[serde(default)]
    pub status: ScanStatus,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub total_ports: u64,
    #[serde(default)]
    pub open_ports: Vec<PortResult>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<Elapsed>,
}

impl ScanSnapshot {
    /// Percentage of ports checked so far, capped at 100. Zero while the
    /// backend has not yet published a total.
    pub fn percent(&self) -> u8 {
        if self.total_ports == 0 {
            return 0;
        }
        let pct = self.progress.saturating_mul(100) / self.total_ports;
        pct.min(100) as u8
    }
}

/// Entry of the history list returned by `GET /api/scans`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub scan_id: String,
    pub target: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub status: ScanStatus,
    #[serde(default)]
    pub open_ports: Vec<PortResult>,
}

/// Body of backend error responses.
#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorBody {
    pub error: String,
}
