/// Lowercase, ASCII-alphanumeric slug with single dashes between words.
/// Anything else is treated as a separator and collapsed.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_title() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn punctuation_collapses() {
        assert_eq!(slugify("What's new, in Rust?!"), "what-s-new-in-rust");
    }

    #[test]
    fn leading_and_trailing_separators_dropped() {
        assert_eq!(slugify("  --Hello--  "), "hello");
    }

    #[test]
    fn consecutive_separators_collapse() {
        assert_eq!(slugify("a   b"), "a-b");
    }

    #[test]
    fn non_ascii_dropped() {
        assert_eq!(slugify("héllo wörld"), "h-llo-w-rld");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("!!!"), "untitled");
    }

    #[test]
    fn already_clean_slug_unchanged() {
        assert_eq!(slugify("my-post-7"), "my-post-7");
    }
}
