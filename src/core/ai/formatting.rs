//! Formatting utilities for model-generated prose.
//!
//! Models love markdown. The chat front-end renders plain text, so the
//! conversational reply of single-turn answers is flattened here.

use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("Invalid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("Invalid regex"));
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#+\s+(.*)").expect("Invalid regex"));
static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*[-*_]{3,}\s*\n").expect("Invalid regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").expect("Invalid regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("Invalid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").expect("Invalid regex"));
static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Invalid regex"));
static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.*?)__").expect("Invalid regex"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("Invalid regex"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.*?)_").expect("Invalid regex"));

/// Converts markdown to plain text by removing formatting.
///
/// Whitespace runs (including newlines) collapse to a single space, so the
/// result is always a single trimmed line.
///
/// # Example
/// ```text
/// "## Rest\n- **Sleep** well" -> "Rest Sleep well"
/// ```
pub fn markdown_to_plain_text(markdown: &str) -> String {
    // Block-level constructs first so list markers aren't mistaken for emphasis.
    let text = CODE_BLOCK.replace_all(markdown, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HEADER.replace_all(&text, "$1");
    let text = HORIZONTAL_RULE.replace_all(&text, "\n\n");
    let text = BULLET.replace_all(&text, "");
    let text = NUMBERED.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(markdown_to_plain_text("Drink water."), "Drink water.");
    }

    #[test]
    fn test_headers_and_emphasis() {
        let input = "## Rest\n**Sleep** at least *eight* hours. __Really__.";
        assert_eq!(
            markdown_to_plain_text(input),
            "Rest Sleep at least eight hours. Really."
        );
    }

    #[test]
    fn test_lists_are_flattened() {
        let input = "Try this:\n- Rest\n* Fluids\n1. Sleep\n2. Repeat";
        assert_eq!(
            markdown_to_plain_text(input),
            "Try this: Rest Fluids Sleep Repeat"
        );
    }

    #[test]
    fn test_links_and_code() {
        let input = "See [the NHS](https://nhs.uk) and `paracetamol`.\n```\nignored\n```\nDone";
        assert_eq!(
            markdown_to_plain_text(input),
            "See the NHS and paracetamol. Done"
        );
    }

    #[test]
    fn test_horizontal_rule_removed() {
        let input = "Above\n---\nBelow";
        assert_eq!(markdown_to_plain_text(input), "Above Below");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_plain_text("   \n\n "), "");
    }
}
