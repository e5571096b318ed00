// src/scan/counter.rs
// =============================================================================
// This module counts hyperlinks in raw page markup.
//
// We don't parse the HTML at all. A link is counted when the text contains
// `href="http://` or `href="https://` exactly:
// - the attribute value must be double-quoted
// - the scheme must be lowercase http or https followed by ://
//
// So `<a href=https://example.com>` (no quotes) does NOT count.
//
// Rust concepts:
// - once_cell::sync::Lazy: a static that is built on first use, then shared
// - Cow<str>: borrowed when the bytes are valid UTF-8, owned otherwise
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

// The pattern is compiled exactly once for the whole process and reused by
// every request and every task.
static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="(http|https)://"#).expect("link pattern is a valid regex")
});

/// Counts quoted `href="http(s)://` occurrences in `content`.
///
/// Matches never overlap. Invalid UTF-8 is replaced, not rejected, since the
/// pattern itself is plain ASCII.
pub fn count_links(content: &[u8]) -> usize {
    let text = String::from_utf8_lossy(content);
    count_links_in_str(&text)
}

/// Same as [`count_links`] for content that is already text.
pub fn count_links_in_str(text: &str) -> usize {
    LINK_PATTERN.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        assert_eq!(count_links_in_str(""), 0);
    }

    #[test]
    fn test_no_links() {
        assert_eq!(count_links_in_str("Hello world"), 0);
    }

    #[test]
    fn test_one_http_link() {
        assert_eq!(count_links_in_str(r#"<a href="http://example.com">Example</a>"#), 1);
    }

    #[test]
    fn test_one_https_link() {
        assert_eq!(count_links_in_str(r#"<a href="https://example.com">Example</a>"#), 1);
    }

    #[test]
    fn test_multiple_links() {
        let html = r#"<a href="https://example.com">Example</a><a href="http://test.com">Test</a>"#;
        assert_eq!(count_links_in_str(html), 2);
    }

    #[test]
    fn test_unquoted_link_is_not_counted() {
        assert_eq!(count_links_in_str("<a href=https://example.com>Example</a>"), 0);
    }

    #[test]
    fn test_relative_and_other_schemes_are_ignored() {
        let html = r#"
            <a href="/docs">Docs</a>
            <a href="mailto:test@example.com">Mail</a>
            <a href='https://single.example'>Single</a>
            <a HREF="https://upper.example">Upper</a>
            <a href="ftp://files.example">Ftp</a>
        "#;
        assert_eq!(count_links_in_str(html), 0);
    }

    #[test]
    fn test_counting_is_idempotent() {
        let html = br#"<html><body>
            <a href="https://example.com">Example</a>
            <a href="https://google.com">Google</a>
            <a href="http://github.com">GitHub</a>
        </body></html>"#;
        let first = count_links(html);
        assert_eq!(first, 3);
        assert_eq!(count_links(html), first);
    }

    #[test]
    fn test_invalid_utf8_still_counts() {
        let mut bytes = vec![0xff, 0xfe];
        bytes.extend_from_slice(br#"<a href="https://example.com">x</a>"#);
        assert_eq!(count_links(&bytes), 1);
    }
}
