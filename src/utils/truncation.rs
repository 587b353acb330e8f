/// Keep at most `max_chars` characters of `text`. Counts chars, not bytes, so
/// multi-byte output from compilers never gets split mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_chars("npm ERR!", 500), "npm ERR!");
    }

    #[test]
    fn test_truncates_to_char_count() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_multibyte_boundary() {
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 2), "éé");
    }
}
