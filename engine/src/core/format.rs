//! Formatting helpers for presenting metrics.

pub fn format_ms(value: f64) -> String {
    format!("{value:.0} ms")
}

pub fn format_signed_ms(value: f64) -> String {
    format!("{value:+.0} ms")
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Formats a `[0, 1]` fraction as a percentage.
pub fn format_fraction(value: f64) -> String {
    format_percent(value * 100.0)
}

pub fn format_multiplier(value: f64) -> String {
    format!("{value:.1}×")
}

pub fn format_flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
