/// Marker appended to truncated previews.
const ELLIPSIS: &str = " ...";

/// Preview of `text` no longer than `max_len` characters.
///
/// Text that fits is returned whole; longer text keeps its first
/// `max_len - 4` characters followed by `" ..."`.
pub fn synopsis(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut preview: String = text.chars().take(keep).collect();
    preview.push_str(ELLIPSIS);
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_kept() {
        assert_eq!(synopsis("hello", 50), "hello");
        assert_eq!(synopsis("", 50), "");
    }

    #[test]
    fn test_long_text_is_truncated() {
        let text = "a".repeat(60);
        let preview = synopsis(&text, 50);
        assert_eq!(preview.chars().count(), 50);
        assert!(preview.ends_with(" ..."));
        assert!(preview.starts_with(&"a".repeat(46)));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "olá ".repeat(20);
        let preview = synopsis(&text, 10);
        assert_eq!(preview, "olá ol ...");
    }
}
