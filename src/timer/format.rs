//! Elapsed time formatting.

/// Formats elapsed seconds as `MM:SS.d`, or `HH:MM:SS.d` once an hour has passed.
///
/// Every field is truncated, never rounded: the value is floored to whole
/// tenths once and all fields are derived from that count.
/// Negative and non-finite inputs render as zero.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    let total_tenths = (seconds * 10.0).floor() as u64;
    let whole = total_tenths / 10;
    let tenths = total_tenths % 10;

    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{}", hours, minutes, secs, tenths)
    } else {
        format!("{:02}:{:02}.{}", minutes, secs, tenths)
    }
}
