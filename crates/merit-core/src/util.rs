//! Small text helpers shared by config, the API client, and the CLI.

/// Longest server error snippet kept in an error message, in characters.
pub const ERROR_SNIPPET_CHARS: usize = 180;

/// `Some(trimmed)` unless the input is missing or blank.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .and_then(non_blank)
        .map(str::to_string)
}

/// The trimmed value, or `None` when nothing is left.
pub fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

/// Whether `value` names an `http://` or `https://` URL.
pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.trim_start().starts_with(scheme))
}

/// Trimmed `value`, cut to at most `max_chars` characters.
pub fn compact_text(value: &str, max_chars: usize) -> String {
    value.trim().chars().take(max_chars).collect()
}
