//! Human-readable byte sizes.
//!
//! Parses magnitudes such as `512`, `10MB`, `64 KiB` or `1.5GB` (SI and IEC
//! suffixes, case-insensitive) and formats byte counts with SI units through
//! `humansize`.

use humansize::{format_size, DECIMAL};

use crate::error::{KvsError, Result};

fn multiplier(suffix: &str) -> Option<u64> {
    let m = match suffix {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "ki" | "kib" => 1 << 10,
        "m" | "mb" => 1_000_000,
        "mi" | "mib" => 1 << 20,
        "g" | "gb" => 1_000_000_000,
        "gi" | "gib" => 1 << 30,
        "t" | "tb" => 1_000_000_000_000,
        "ti" | "tib" => 1 << 40,
        "p" | "pb" => 1_000_000_000_000_000,
        "pi" | "pib" => 1 << 50,
        "e" | "eb" => 1_000_000_000_000_000_000,
        "ei" | "eib" => 1 << 60,
        _ => return None,
    };
    Some(m)
}

/// Parses a human-readable byte size into a byte count.
pub fn parse_bytes(input: &str) -> Result<u64> {
    let invalid = || KvsError::InvalidDsn(format!("Invalid storage size: {input:?}"));

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    let number = number.replace(',', "");
    if number.is_empty() {
        return Err(invalid());
    }
    let mult = multiplier(&suffix.trim().to_ascii_lowercase()).ok_or_else(invalid)?;

    if number.contains('.') {
        let value: f64 = number.parse().map_err(|_| invalid())?;
        let bytes = value * mult as f64;
        if !bytes.is_finite() || bytes < 0.0 || bytes >= u64::MAX as f64 {
            return Err(invalid());
        }
        Ok(bytes as u64)
    } else {
        let value: u64 = number.parse().map_err(|_| invalid())?;
        value.checked_mul(mult).ok_or_else(invalid)
    }
}

/// Formats a byte count using SI units, e.g. `10 MB` or `1.5 kB`.
pub fn format_bytes(n: u64) -> String {
    format_size(n, DECIMAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!(parse_bytes("512").unwrap(), 512);
        assert_eq!(parse_bytes("128B").unwrap(), 128);
        assert_eq!(parse_bytes("1,024").unwrap(), 1024);
    }

    #[test]
    fn test_parse_si_and_iec() {
        assert_eq!(parse_bytes("10MB").unwrap(), 10_000_000);
        assert_eq!(parse_bytes("10 mb").unwrap(), 10_000_000);
        assert_eq!(parse_bytes("64KiB").unwrap(), 65_536);
        assert_eq!(parse_bytes("2G").unwrap(), 2_000_000_000);
        assert_eq!(parse_bytes("1Mi").unwrap(), 1 << 20);
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(parse_bytes("1.5kB").unwrap(), 1500);
        assert_eq!(parse_bytes("0.5 KiB").unwrap(), 512);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_bytes("").is_err());
        assert!(parse_bytes("MB").is_err());
        assert!(parse_bytes("10 parsecs").is_err());
        assert!(parse_bytes("-5").is_err());
        assert!(parse_bytes("99999999999EB").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_bytes(128), "128 B");
        assert_eq!(format_bytes(1_000), "1 kB");
        assert_eq!(format_bytes(10_000_000), "10 MB");
        assert_eq!(format_bytes(64_000_000), "64 MB");
    }
}
