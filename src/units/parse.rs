//! Threshold parsing: "10GB", "500 mb", "1.5TB", "0".

use super::{GB, KB, MB, TB};
use crate::config::ConfigError;

/// Parse a human-friendly size into bytes using binary multipliers.
///
/// Accepts `<number>[.<number>]<unit>` where the unit is one of `B`, `KB`,
/// `MB`, `GB`, `TB` or empty (bytes), case-insensitive, with optional
/// whitespace before the unit. Fractional sizes are truncated to whole bytes.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let normalized = input.trim().to_ascii_uppercase();
    let invalid = |reason: String| ConfigError::InvalidSize {
        input: input.to_string(),
        reason,
    };

    let split = normalized
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(normalized.len());
    let (number, unit) = normalized.split_at(split);

    if !is_decimal(number) {
        return Err(invalid("use a format like '10GB' or '500MB'".to_string()));
    }

    let multiplier = match unit.trim_start() {
        "" | "B" => 1,
        "KB" => KB,
        "MB" => MB,
        "GB" => GB,
        "TB" => TB,
        other => return Err(invalid(format!("unsupported unit '{}'", other))),
    };

    // Whole numbers stay in integer arithmetic so large byte counts are exact.
    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("value does not fit in 64 bits".to_string()));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| invalid("use a format like '10GB' or '500MB'".to_string()))?;
    let bytes = value * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(invalid("value does not fit in 64 bits".to_string()));
    }
    Ok(bytes as u64)
}

fn is_decimal(s: &str) -> bool {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match s.split_once('.') {
        Some((whole, frac)) => all_digits(whole) && all_digits(frac),
        None => all_digits(s),
    }
}
