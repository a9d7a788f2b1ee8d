//! User-facing time formatting.

/// Formats a tick count as `M:SS`.
///
/// Minutes are unpadded and unbounded; seconds are zero-padded to two
/// digits.
#[must_use]
pub fn format_time(ticks: u64) -> String {
    format!("{}:{:02}", ticks / 60, ticks % 60)
}
