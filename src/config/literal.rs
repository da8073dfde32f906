//! Size and duration literals used in the cache configuration.
//!
//! # Grammar (case-insensitive)
//! - size: `^\d+(B|KB|MB)$`, e.g. `"8MB"`, `"1024KB"`, `"1048576B"`
//! - time: `^\d+S$`, e.g. `"86400S"`
//!
//! Plain integers are accepted as raw bytes / seconds.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A malformed size or time literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigFormatError {
    #[error("invalid size literal {0:?}, expected e.g. \"8MB\", \"1024KB\" or \"1048576B\"")]
    Size(String),

    #[error("invalid time literal {0:?}, expected e.g. \"86400S\"")]
    Time(String),
}

/// A byte size as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SizeLiteral {
    Bytes(u64),
    Text(String),
}

impl SizeLiteral {
    /// Resolve to a byte count.
    pub fn to_bytes(&self) -> Result<u64, ConfigFormatError> {
        match self {
            SizeLiteral::Bytes(n) => Ok(*n),
            SizeLiteral::Text(s) => parse_size(s),
        }
    }
}

impl From<&str> for SizeLiteral {
    fn from(s: &str) -> Self {
        SizeLiteral::Text(s.to_string())
    }
}

impl fmt::Display for SizeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeLiteral::Bytes(n) => write!(f, "{}B", n),
            SizeLiteral::Text(s) => f.write_str(s),
        }
    }
}

/// A duration in seconds as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimeLiteral {
    Seconds(u64),
    Text(String),
}

impl TimeLiteral {
    /// Resolve to whole seconds.
    pub fn to_secs(&self) -> Result<u64, ConfigFormatError> {
        match self {
            TimeLiteral::Seconds(n) => Ok(*n),
            TimeLiteral::Text(s) => parse_time(s),
        }
    }
}

impl From<&str> for TimeLiteral {
    fn from(s: &str) -> Self {
        TimeLiteral::Text(s.to_string())
    }
}

/// Parse `<digits>(B|KB|MB)` into bytes.
pub fn parse_size(literal: &str) -> Result<u64, ConfigFormatError> {
    let err = || ConfigFormatError::Size(literal.to_string());

    let (digits, unit) = split_digits(literal).ok_or_else(err)?;
    let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
        "B" => 1,
        "KB" => 1024,
        "MB" => 1024 * 1024,
        _ => return Err(err()),
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(err)
}

/// Parse `<digits>S` into seconds.
pub fn parse_time(literal: &str) -> Result<u64, ConfigFormatError> {
    let err = || ConfigFormatError::Time(literal.to_string());

    let (digits, unit) = split_digits(literal).ok_or_else(err)?;
    if !unit.eq_ignore_ascii_case("s") {
        return Err(err());
    }
    digits.parse::<u64>().map_err(|_| err())
}

/// Split a literal into its leading ASCII digits and the remaining suffix.
/// Returns `None` when there are no leading digits.
fn split_digits(literal: &str) -> Option<(&str, &str)> {
    let end = literal
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(literal.len());
    if end == 0 {
        return None;
    }
    Some(literal.split_at(end))
}

/// Human-readable byte count, e.g. `1.50MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1048576B").unwrap(), 1_048_576);
        assert_eq!(parse_size("1024KB").unwrap(), 1_048_576);
        assert_eq!(parse_size("8MB").unwrap(), 8 * 1024 * 1024);
        assert_eq!(parse_size("0B").unwrap(), 0);
    }

    #[test]
    fn test_parse_size_case_insensitive() {
        assert_eq!(parse_size("8mb").unwrap(), 8 * 1024 * 1024);
        assert_eq!(parse_size("2Kb").unwrap(), 2048);
        assert_eq!(parse_size("7b").unwrap(), 7);
    }

    #[test]
    fn test_parse_size_rejects_malformed() {
        for bad in ["", "MB", "8", "8 MB", "8GB", "-8MB", "8.5MB", "8MBs", " 8MB"] {
            assert_eq!(
                parse_size(bad),
                Err(ConfigFormatError::Size(bad.to_string())),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_size_overflow_is_an_error() {
        assert!(parse_size("99999999999999999999MB").is_err());
        assert!(parse_size("18446744073709551615MB").is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("86400S").unwrap(), 86400);
        assert_eq!(parse_time("5s").unwrap(), 5);
        for bad in ["", "S", "86400", "10m", "1.5S", "S10"] {
            assert!(parse_time(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_literal_accepts_numbers() {
        let size: SizeLiteral = serde_json::from_str("4096").unwrap();
        assert_eq!(size.to_bytes().unwrap(), 4096);

        let size: SizeLiteral = serde_json::from_str("\"4KB\"").unwrap();
        assert_eq!(size.to_bytes().unwrap(), 4096);

        let time: TimeLiteral = serde_json::from_str("60").unwrap();
        assert_eq!(time.to_secs().unwrap(), 60);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00B");
        assert_eq!(format_size(512), "512.00B");
        assert_eq!(format_size(1536), "1.50KB");
        assert_eq!(format_size(8 * 1024 * 1024), "8.00MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00GB");
    }
}
