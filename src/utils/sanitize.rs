const EXCERPT_CHARS: usize = 250;

/// Clean user-supplied HTML down to a conservative allowlist.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Build an excerpt from post content: strip all markup, truncate, ellipsis.
pub fn derive_excerpt(content: &str) -> String {
    let text = ammonia::Builder::empty().clean(content).to_string();
    let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tags_removed() {
        let cleaned = sanitize_html("hello <script>alert(1)</script> world");
        assert!(!cleaned.contains("<script>"));
        assert!(cleaned.contains("hello"));
    }

    #[test]
    fn excerpt_strips_markup() {
        let excerpt = derive_excerpt("<p>Some <b>bold</b> text</p>");
        assert!(!excerpt.contains('<'));
        assert!(excerpt.starts_with("Some bold text"));
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn excerpt_truncates_long_content() {
        let long = "x".repeat(1000);
        let excerpt = derive_excerpt(&long);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn excerpt_handles_multibyte_boundaries() {
        let long = "é".repeat(300);
        let excerpt = derive_excerpt(&long);
        assert!(excerpt.ends_with("..."));
    }
}
