//! Byte-count conversions: threshold strings in, human-readable sizes out.

pub mod format;
pub mod parse;

pub use self::format::{format_bytes, format_bytes_multi};
pub use self::parse::parse_size;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
pub const GB: u64 = 1024 * MB;
pub const TB: u64 = 1024 * GB;
