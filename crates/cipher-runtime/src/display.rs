//! Display helpers for CLI output: relative ages and column truncation.

use chrono::{DateTime, Utc};

/// Compact age of `then` as seen from `now`: `just now`, `5m ago`, `3h ago`,
/// `2d ago`, `6w ago`.
/// Future timestamps (clock skew) read as `just now`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let s = (now - then).num_seconds().max(0).unsigned_abs();
    if s < 60 {
        "just now".to_string()
    } else if s < 3600 {
        format!("{}m ago", s / 60)
    } else if s < 86400 {
        format!("{}h ago", s / 3600)
    } else if s < 86400 * 30 {
        format!("{}d ago", s / 86400)
    } else {
        format!("{}w ago", s / (86400 * 7))
    }
}

/// Right-truncate to `max_chars` characters, appending `…` if truncated.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}\u{2026}")
}
