/// First `max_chars` Unicode scalar values of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Longest prefix of `s` that is at most `max_units` UTF-16 code units long.
pub fn truncate_utf16(s: &str, max_units: usize) -> &str {
    let mut units = 0;
    for (idx, ch) in s.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return &s[..idx];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_text_is_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(truncate_chars("മലയാളം", 3), "മലയ");
        assert_eq!(truncate_chars("👑🔥🎉", 2), "👑🔥");
    }

    #[test]
    fn zero_limit_is_empty() {
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(truncate_utf16("abc", 0), "");
    }

    #[test]
    fn utf16_counts_surrogate_pairs_as_two() {
        assert_eq!(truncate_utf16("👑🔥🎉", 4), "👑🔥");
        assert_eq!(truncate_utf16("👑🔥🎉", 3), "👑");
        assert_eq!(truncate_utf16("മലയാളം", 3), "മലയ");
        assert_eq!(truncate_utf16("hello", 10), "hello");
    }
}
