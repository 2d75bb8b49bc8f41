/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip a markdown code fence some models wrap JSON in, even in JSON mode.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        let text = "Fact check: 世界";
        let truncated = truncate_to_char_boundary(text, 14);
        assert!(truncated.len() <= 14);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_to_char_boundary("claim", 100), "claim");
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_blocks("```json\n{\"veracity\":\"true\"}\n```"), "{\"veracity\":\"true\"}");
        assert_eq!(strip_code_blocks("  {}  "), "{}");
    }
}
