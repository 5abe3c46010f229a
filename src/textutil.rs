//! Shared UTF-8-safe truncation helpers.
//!
//! Reply text ends up in log lines and fingerprints. Byte slicing can panic
//! when the cut falls inside a multi-byte character, so every cut goes
//! through these helpers.

/// Return a UTF-8-safe prefix holding at most `max_chars` characters.
pub fn prefix_by_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Truncate by characters and append `suffix` when truncation occurs.
pub fn truncate_with_suffix_by_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    let prefix = prefix_by_chars(text, max_chars);
    if prefix.len() == text.len() {
        return text.to_string();
    }
    format!("{prefix}{suffix}")
}

/// Single-line excerpt for log fields: newlines flattened, then truncated.
pub fn log_excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " | ");
    truncate_with_suffix_by_chars(&flat, max_chars, "...")
}
