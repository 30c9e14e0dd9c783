//! Display formatting for timestamps and file sizes.

use crate::i18n::{t, weekday_name};
use chrono::{DateTime, Datelike, Local};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Label a Unix timestamp relative to the current local time.
pub fn format_timestamp(epoch_secs: i64, lang: &str) -> String {
    format_timestamp_at(epoch_secs, Local::now(), lang)
}

/// Label a Unix timestamp relative to `now`.
///
/// Buckets by whole elapsed days: 0 is today, 1 is yesterday, under 7 shows
/// the weekday, anything older the full date. Future timestamps count as today.
pub fn format_timestamp_at(epoch_secs: i64, now: DateTime<Local>, lang: &str) -> String {
    let Some(date) = DateTime::from_timestamp(epoch_secs, 0) else {
        return epoch_secs.to_string();
    };
    let date = date.with_timezone(&Local);
    let diff_days = (now - date).num_days().max(0);
    let time = date.format("%H:%M");

    match diff_days {
        0 => format!("{} {time}", t("today", lang)),
        1 => format!("{} {time}", t("yesterday", lang)),
        2..=6 => format!("{} {time}", weekday_name(date.weekday(), lang)),
        _ => date.format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Human-readable byte count, scaled by powers of 1024 and rounded to one
/// decimal. A trailing `.0` is dropped (`1024` gives `"1 KB"`).
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let rounded = (bytes as f64 / scale as f64 * 10.0).round() / 10.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}
