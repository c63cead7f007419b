use std::cmp::Reverse;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::types::{ScanStatus, ScanSummary};

/// Parse a backend timestamp. The backend writes local wall-clock time as
/// `YYYY-MM-DD HH:MM:SS`; RFC 3339 is accepted as well. Wall-clock values are
/// read as UTC, which is fine for ordering scans from the same backend.
pub fn parse_start_time(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    let plain = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(s, plain) {
        return Some(dt.assume_utc());
    }
    OffsetDateTime::parse(s, &Rfc3339).ok()
}

/// Newest scan first. Entries with equal start times keep their order;
/// entries whose start time cannot be read go last.
pub fn sort_newest_first(scans: &mut [ScanSummary]) {
    scans.sort_by_cached_key(|s| match parse_start_time(&s.start_time) {
        Some(t) => (false, Reverse(t)),
        None => (true, Reverse(OffsetDateTime::UNIX_EPOCH)),
    });
}

impl ScanSummary {
    /// Date part of the start time (text before the first space).
    pub fn date(&self) -> &str {
        self.start_time
            .split(' ')
            .next()
            .unwrap_or(&self.start_time)
    }

    pub fn open_port_count(&self) -> usize {
        self.open_ports.len()
    }

    /// Card style: anything that is neither completed nor running is shown
    /// as failed.
    pub fn status_class(&self) -> &'static str {
        match self.status {
            ScanStatus::Completed => "completed",
            ScanStatus::Running => "running",
            _ => "failed",
        }
    }
}
