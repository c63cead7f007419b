use crate::types::{PortResult, RiskLevel};

/// Rank given to levels outside the fixed scale, and to ports with no level.
pub const UNRANKED: u16 = 999;

/// Position of a level on the severity scale, most severe first.
pub fn severity_rank(level: Option<&RiskLevel>) -> u16 {
    match level {
        Some(RiskLevel::Critical) => 1,
        Some(RiskLevel::High) => 2,
        Some(RiskLevel::Medium) => 3,
        Some(RiskLevel::Low) => 4,
        Some(RiskLevel::Unknown) => 5,
        Some(RiskLevel::Other(_)) | None => UNRANKED,
    }
}

/// Sort open ports by severity: Critical, High, Medium, Low, Unknown, then
/// anything unranked. Ports of equal severity keep their incoming order.
pub fn sort_by_risk(ports: &mut [PortResult]) {
    ports.sort_by_key(|p| severity_rank(p.risk_level.as_ref()));
}
