//! Plain-text views of scans for the terminal.

use std::env;
use std::fmt::Write as _;
use std::io::IsTerminal;

use crate::types::{PortResult, RiskLevel, ScanSnapshot, ScanStatus, ScanSummary};

const BAR_WIDTH: usize = 30;

pub fn supports_color() -> bool {
    std::io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none()
}

pub fn paint(text: &str, ansi_code: &str, enabled: bool) -> String {
    if enabled {
        format!("\x1b[{ansi_code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn risk_color(level: Option<&RiskLevel>) -> &'static str {
    match level {
        Some(RiskLevel::Critical) => "1;31",
        Some(RiskLevel::High) => "31",
        Some(RiskLevel::Medium) => "33",
        Some(RiskLevel::Low) => "32",
        _ => "2;37",
    }
}

pub fn status_badge(status: ScanStatus) -> &'static str {
    match status {
        ScanStatus::Running => "Scanning...",
        ScanStatus::Completed => "Completed",
        ScanStatus::Failed => "Failed",
        ScanStatus::Unknown => "Unknown",
    }
}

/// One-line progress view: badge, bar, percentage, counters.
pub fn progress_line(snapshot: &ScanSnapshot, color: bool) -> String {
    let pct = usize::from(snapshot.percent());
    let filled = pct * BAR_WIDTH / 100;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    let badge_code = match snapshot.status {
        ScanStatus::Running => "1;33",
        ScanStatus::Completed => "1;32",
        _ => "1;31",
    };
    format!(
        "{} [{}] {:>3}%  {}/{} ports  open: {}",
        paint(status_badge(snapshot.status), badge_code, color),
        bar,
        pct,
        snapshot.progress,
        snapshot.total_ports,
        snapshot.open_ports.len()
    )
}

/// Open ports found so far, as `port (service)` badges.
pub fn open_port_badges(ports: &[PortResult]) -> String {
    let badges: Vec<String> = ports
        .iter()
        .map(|p| format!("{} ({})", p.port, p.service))
        .collect();
    if badges.is_empty() {
        format!("Open ports ({})", ports.len())
    } else {
        format!("Open ports ({}): {}", ports.len(), badges.join("  "))
    }
}

/// Summary block and port table for a finished scan. Ports are printed in
/// the order given; callers sort them by risk first.
pub fn final_report(snapshot: &ScanSnapshot, details: bool, color: bool) -> String {
    let mut out = String::new();
    let na = || "N/A".to_string();
    let _ = writeln!(out, "{}", paint("Scan results", "1;37", color));
    let _ = writeln!(out, "  Target        : {}", snapshot.target);
    let _ = writeln!(out, "  Algorithm     : {}", snapshot.algorithm);
    let _ = writeln!(out, "  Status        : {}", snapshot.status);
    let _ = writeln!(out, "  Start time    : {}", snapshot.start_time);
    let _ = writeln!(
        out,
        "  End time      : {}",
        snapshot.end_time.clone().unwrap_or_else(na)
    );
    let _ = writeln!(
        out,
        "  Duration      : {}",
        snapshot
            .elapsed_time
            .as_ref()
            .map(|e| format!("{e}s"))
            .unwrap_or_else(na)
    );
    let _ = writeln!(out, "  Ports scanned : {}", snapshot.total_ports);
    out.push('\n');

    if snapshot.open_ports.is_empty() {
        let _ = writeln!(out, "No open ports found");
        return out;
    }

    let port_w = "port".len().max(5);
    let mut service_w = "service".len();
    let mut risk_w = "risk".len();
    for p in &snapshot.open_ports {
        service_w = service_w.max(p.service.len());
        risk_w = risk_w.max(p.risk_label().len());
    }

    let _ = writeln!(
        out,
        "{:>port_w$}  {:<service_w$}  {:<risk_w$}",
        "port", "service", "risk"
    );
    let _ = writeln!(out, "{:->port_w$}  {:-<service_w$}  {:-<risk_w$}", "", "", "");
    for p in &snapshot.open_ports {
        // Pad before painting so escape codes do not skew the columns.
        let risk = format!("{:<risk_w$}", p.risk_label());
        let _ = writeln!(
            out,
            "{:>port_w$}  {:<service_w$}  {}",
            p.port,
            p.service,
            paint(&risk, risk_color(p.risk_level.as_ref()), color)
        );
        if details {
            if let Some(desc) = p.risk_description.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "{:port_w$}  Risk Description: {desc}", "");
            }
            if let Some(rec) = p.recommendations.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "{:port_w$}  Recommendations: {rec}", "");
            }
        }
    }
    out
}

/// History cards, one block per scan, in the order given.
pub fn history_list(scans: &[ScanSummary], color: bool) -> String {
    if scans.is_empty() {
        return "No scan history yet\n".to_string();
    }
    let mut out = String::new();
    for scan in scans {
        let class_code = match scan.status_class() {
            "completed" => "32",
            "running" => "33",
            _ => "31",
        };
        let _ = writeln!(
            out,
            "{} {}",
            paint("Target:", "1;37", color),
            scan.target
        );
        let _ = writeln!(
            out,
            "  Algorithm: {:<6} Open Ports: {}",
            scan.algorithm,
            scan.open_port_count()
        );
        let _ = writeln!(
            out,
            "  Date: {:<11} Status: {}",
            scan.date(),
            paint(scan.status.as_str(), class_code, color)
        );
        let _ = writeln!(out, "  id: {}", scan.scan_id);
    }
    out
}
