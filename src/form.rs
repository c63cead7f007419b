use std::fmt;

use crate::error::ValidationError;
use crate::types::{Algorithm, ScanRequest};

pub const DEFAULT_MAX_THREADS: u32 = 10;
pub const DEFAULT_PORT_RANGE_START: i64 = 1;
pub const DEFAULT_PORT_RANGE_END: i64 = 1024;

const PORT_MIN: i64 = 1;
const PORT_MAX: i64 = 65535;

/// Raw scan form input as the user typed it.
///
/// Numeric fields are kept as text and interpreted at submit time, so a
/// half-typed or empty field falls back to its default instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanForm {
    pub target: String,
    pub algorithm: Algorithm,
    pub common_ports_first: bool,
    pub max_threads: String,
    pub port_range_start: String,
    pub port_range_end: String,
}

impl Default for ScanForm {
    fn default() -> Self {
        Self {
            target: String::new(),
            algorithm: Algorithm::Bfs,
            common_ports_first: true,
            max_threads: DEFAULT_MAX_THREADS.to_string(),
            port_range_start: DEFAULT_PORT_RANGE_START.to_string(),
            port_range_end: DEFAULT_PORT_RANGE_END.to_string(),
        }
    }
}

/// Notice emitted when editing one end of the range had to be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAdjusted {
    pub start: i64,
    pub end: i64,
}

impl RangeAdjusted {
    pub const MESSAGE: &'static str = "Start port must be less than or equal to end port";
}

impl fmt::Display for RangeAdjusted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

impl ScanForm {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Edit the start of the range. If the new start overtakes the end, the
    /// start is reset to the end.
    pub fn set_port_range_start(&mut self, value: impl Into<String>) -> Option<RangeAdjusted> {
        self.port_range_start = value.into();
        let (start, end) = self.raw_range()?;
        if start > end {
            self.port_range_start = end.to_string();
            return Some(RangeAdjusted { start: end, end });
        }
        None
    }

    /// Edit the end of the range. If the new end falls below the start, the
    /// end is reset to the start.
    pub fn set_port_range_end(&mut self, value: impl Into<String>) -> Option<RangeAdjusted> {
        self.port_range_end = value.into();
        let (start, end) = self.raw_range()?;
        if start > end {
            self.port_range_end = start.to_string();
            return Some(RangeAdjusted { start, end: start });
        }
        None
    }

    fn raw_range(&self) -> Option<(i64, i64)> {
        Some((
            parse_form_int(&self.port_range_start)?,
            parse_form_int(&self.port_range_end)?,
        ))
    }

    /// Validate the form and build the request body.
    ///
    /// Checks run in order: non-empty target, start <= end, then both ends
    /// inside [1, 65535].
    pub fn to_request(&self) -> Result<ScanRequest, ValidationError> {
        let target = self.target.trim();
        let max_threads = match parse_form_int(&self.max_threads) {
            Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => DEFAULT_MAX_THREADS,
        };
        let start = int_or(&self.port_range_start, DEFAULT_PORT_RANGE_START);
        let end = int_or(&self.port_range_end, DEFAULT_PORT_RANGE_END);

        if target.is_empty() {
            return Err(ValidationError::EmptyTarget);
        }
        let (port_range_start, port_range_end) = validate_port_range(start, end)?;

        Ok(ScanRequest {
            target: target.to_string(),
            algorithm: self.algorithm,
            common_ports_first: self.common_ports_first,
            max_threads,
            port_range_start,
            port_range_end,
        })
    }
}

/// Check an inclusive port range and narrow it to `u16`.
pub fn validate_port_range(start: i64, end: i64) -> Result<(u16, u16), ValidationError> {
    if start > end {
        return Err(ValidationError::RangeInverted { start, end });
    }
    if start < PORT_MIN || end > PORT_MAX {
        return Err(ValidationError::RangeOutOfBounds { start, end });
    }
    // Both ends are inside [1, 65535] here.
    Ok((start as u16, end as u16))
}

/// Lenient integer parse for form text: leading whitespace, optional sign,
/// then as many digits as are present. Trailing text is ignored. Returns
/// `None` when no digit follows the sign.
pub fn parse_form_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let magnitude = digits[..len]
        .bytes()
        .try_fold(0i64, |acc, b| {
            acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
        })
        .unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Unparseable or zero input takes the default.
fn int_or(s: &str, default: i64) -> i64 {
    match parse_form_int(s) {
        Some(0) | None => default,
        Some(v) => v,
    }
}
