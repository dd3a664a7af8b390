//! Parsing of the text-formatted usage snapshots.
//!
//! Providers report usage as display strings such as `"CPU: 45.2%"` and
//! `"Used: 8.5 GB\nTotal: 16.0 GB"`; these helpers turn them back into numbers.

use humansize::{format_size, WINDOWS};

use crate::error::{DevexError, Result};

const KIB: f64 = 1024.0;

/// Byte multiplier table, matched as a case-insensitive prefix of the unit.
const UNIT_TABLE: [(&str, f64); 5] = [
    ("B", 1.0),
    ("KB", KIB),
    ("MB", KIB * KIB),
    ("GB", KIB * KIB * KIB),
    ("TB", KIB * KIB * KIB * KIB),
];

/// Markers a provider uses in place of a value when it has nothing to report
const UNAVAILABLE_MARKERS: [&str; 2] = ["Error", "No data"];

/// Convert `value` expressed in `unit` to a byte count.
///
/// Unrecognised units pass the value through as raw bytes.
pub fn convert_to_bytes(value: f64, unit: &str) -> u64 {
    let unit = unit.trim().to_ascii_uppercase();

    let multiplier = UNIT_TABLE
        .iter()
        .find(|(prefix, _)| unit.starts_with(prefix))
        .map(|(_, m)| *m)
        .unwrap_or(1.0);

    (value * multiplier) as u64
}

/// Render a byte count the way usage details are written (`"8.5 GB"`),
/// so [`parse_used_total`] reads it back with the same unit table.
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, WINDOWS.decimal_places(1))
}

/// Parse a `"<LABEL>: <value>%"` snapshot into its percentage.
pub fn parse_usage_percent(text: &str) -> Result<f64> {
    let text = text.trim();
    if UNAVAILABLE_MARKERS.iter().any(|m| text.ends_with(m)) {
        return Err(DevexError::provider_unavailable(text.to_string()));
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(DevexError::parse(format!("unexpected usage format: {:?}", text)));
    }

    let value = parts[1].trim_end_matches('%');
    value
        .parse::<f64>()
        .map_err(|e| DevexError::parse(format!("invalid usage value {:?}: {}", value, e)))
}

/// Parse a `"Used: 8.5 GB\nTotal: 16.0 GB"` snapshot into `(used, total)` bytes.
pub fn parse_used_total(text: &str) -> Result<(u64, u64)> {
    let lines: Vec<&str> = text.trim().lines().collect();
    if lines.len() != 2 {
        return Err(DevexError::parse(format!("unexpected details format: {:?}", text)));
    }

    Ok((parse_size_line(lines[0])?, parse_size_line(lines[1])?))
}

/// `"Used: 8.5 GB"` -> bytes
fn parse_size_line(line: &str) -> Result<u64> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(DevexError::parse(format!("unexpected size line: {:?}", line)));
    }

    let value = parts[1]
        .parse::<f64>()
        .map_err(|e| DevexError::parse(format!("invalid size value {:?}: {}", parts[1], e)))?;

    Ok(convert_to_bytes(value, parts[2]))
}
