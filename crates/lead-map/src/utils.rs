//! Text helpers for the matcher and the prompt builder.

/// Lowercases and drops every character that is not an ASCII letter or digit.
///
/// `"E-Mail_Address"`, `"email address"` and `"EMAILADDRESS"` all normalize
/// to `"emailaddress"`.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Cuts a value to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_value(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars).collect();
    out.push('…');
    out
}
