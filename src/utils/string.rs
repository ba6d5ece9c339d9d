/// Largest char boundary at or before `max_bytes`, safe to slice at.
#[inline]
fn safe_byte_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    s.char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_bytes)
        .last()
        .unwrap_or(0)
}

/// Truncate with a marker when the input exceeds `max_len` bytes,
/// respecting UTF-8 boundaries.
#[inline]
pub fn truncate_with_marker(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let boundary = safe_byte_boundary(s, max_len);
        format!("{}...[truncated]", &s[..boundary])
    }
}

/// Random 8-hex-char id, used for session and submission suffixes.
pub fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
