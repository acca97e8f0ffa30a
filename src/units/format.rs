//! Human-readable byte counts.

use super::{GB, KB, MB, TB};

const SCALED_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

const COMPONENT_UNITS: [(&str, u64); 5] = [
    ("TB", TB),
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("B", 1),
];

/// Format a byte count in the largest unit that keeps the value below 1024,
/// with two decimals: "10.00 GB". PB is the ceiling.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in SCALED_UNITS {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} PB", value)
}

/// Format a byte count as whole-number components: "1 TB 54 GB 180 MB".
///
/// Zero components are omitted; zero bytes renders as "0 B".
pub fn format_bytes_multi(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut parts = Vec::new();
    let mut remaining = bytes;
    for (unit, size) in COMPONENT_UNITS {
        if remaining >= size {
            parts.push(format!("{} {}", remaining / size, unit));
            remaining %= size;
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component_sum(rendered: &str) -> u64 {
        let tokens: Vec<&str> = rendered.split(' ').collect();
        tokens
            .chunks(2)
            .map(|pair| {
                let count: u64 = pair[0].parse().unwrap();
                assert_ne!(count, 0, "zero component in {:?}", rendered);
                let size = COMPONENT_UNITS
                    .iter()
                    .find(|(name, _)| *name == pair[1])
                    .map(|(_, size)| *size)
                    .unwrap();
                count * size
            })
            .sum()
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(10 * GB), "10.00 GB");
        assert_eq!(format_bytes(TB), "1.00 TB");
        assert_eq!(format_bytes(2048 * TB), "2.00 PB");
    }

    #[test]
    fn test_format_multi_zero() {
        assert_eq!(format_bytes_multi(0), "0 B");
    }

    #[test]
    fn test_format_multi_components() {
        assert_eq!(format_bytes_multi(1), "1 B");
        assert_eq!(format_bytes_multi(KB), "1 KB");
        assert_eq!(format_bytes_multi(TB + 54 * GB + 180 * MB), "1 TB 54 GB 180 MB");
        assert_eq!(format_bytes_multi(GB + 1), "1 GB 1 B");
        assert_eq!(format_bytes_multi(95 * GB + 201 * MB + 7), "95 GB 201 MB 7 B");
    }

    #[test]
    fn test_format_multi_sums_to_input() {
        let samples = [
            1u64,
            1023,
            1025,
            MB - 1,
            102_176_960_512,
            1_099_511_628_288 + 57_982_058_496 + 188_743_680,
            u64::MAX,
        ];
        for bytes in samples {
            assert_eq!(component_sum(&format_bytes_multi(bytes)), bytes);
        }
    }
}
