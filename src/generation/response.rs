//! Cleanup of raw backend output into a plain commit message.

use std::sync::LazyLock;

use regex_lite::Regex;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI escape pattern is valid")
});

static THINK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>.*?</think>").expect("think block pattern is valid")
});

/// Strip terminal escapes, reasoning blocks and a wrapping code fence.
///
/// Returns an empty string when nothing usable is left.
pub fn clean_response(raw: &str) -> String {
    let without_ansi = ANSI_ESCAPE.replace_all(raw, "");
    let without_think = THINK_BLOCK.replace_all(&without_ansi, "");
    let trimmed = without_think.trim();

    unwrap_code_fence(trimmed).trim().to_string()
}

/// If the whole response is one fenced block, return its contents.
fn unwrap_code_fence(text: &str) -> &str {
    if !text.starts_with("```") || !text.ends_with("```") || text.len() < 6 {
        return text;
    }

    let inner = &text[3..text.len() - 3];
    // Drop an info string such as ```text
    match inner.find('\n') {
        Some(newline) if !inner[..newline].contains(' ') => &inner[newline + 1..],
        _ => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_message_is_trimmed() {
        assert_eq!(
            clean_response("\n  Add cache layer\n\nLookups were slow.  \n"),
            "Add cache layer\n\nLookups were slow."
        );
    }

    #[test]
    fn test_clean_removes_ansi_escapes() {
        let raw = "\x1b[?25l\x1b[2KAdd cache layer\x1b[0m";
        assert_eq!(clean_response(raw), "Add cache layer");
    }

    #[test]
    fn test_clean_removes_think_blocks() {
        let raw = "<think>\nThe diff adds a cache.\n</think>\n\nAdd cache layer";
        assert_eq!(clean_response(raw), "Add cache layer");
    }

    #[test]
    fn test_clean_unwraps_code_fence() {
        let raw = "```\nAdd cache layer\n\nLookups were slow.\n```";
        assert_eq!(clean_response(raw), "Add cache layer\n\nLookups were slow.");
    }

    #[test]
    fn test_clean_unwraps_code_fence_with_info_string() {
        let raw = "```text\nAdd cache layer\n```";
        assert_eq!(clean_response(raw), "Add cache layer");
    }

    #[test]
    fn test_clean_keeps_inner_fences() {
        let raw = "Add parser\n\nHandles ```code``` spans.";
        assert_eq!(clean_response(raw), raw);
    }

    #[test]
    fn test_clean_whitespace_only_is_empty() {
        assert_eq!(clean_response("   \n\t\n"), "");
        assert_eq!(clean_response("<think>only thoughts</think>"), "");
    }
}
