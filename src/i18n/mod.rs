//! Localized labels for the JSON sent to clients.
//!
//! Uses a simple `t(key, lang)` function for static strings.
//! Supported languages: English (fallback) and Portuguese.

mod labels;


pub use labels::weekday_name;

/// Return a localized static string for `key` in the given `lang`.
/// Falls back to English for unknown keys or unsupported languages.
pub fn t(key: &str, lang: &str) -> &'static str {
    labels::lookup(key, lang)
        .or_else(|| labels::lookup(key, "English"))
        .unwrap_or("???")
}
