//! Cleanup of LaTeX sources before chunking.

use regex::Regex;
use std::sync::LazyLock;

/// A `%` not preceded by a backslash starts a comment that runs to end of line.
/// The preceding character (if any) is captured so it can be put back.
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^\\])%.*").expect("valid comment regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strip line comments, collapse whitespace runs to one space, trim.
///
/// Escaped percent signs (`\%`) are kept. The result is a single line and
/// preprocessing it again returns it unchanged.
///
/// # Example
/// ```
/// use paperbot_knowledge::preprocess::preprocess;
///
/// let raw = "Rates of 5\\% hold. % reviewer note\nNext   line.";
/// assert_eq!(preprocess(raw), "Rates of 5\\% hold. Next line.");
/// ```
pub fn preprocess(raw: &str) -> String {
    let without_comments = LINE_COMMENT.replace_all(raw, "${1}");
    let collapsed = WHITESPACE.replace_all(&without_comments, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_comment_to_end_of_line() {
        let raw = "Gradient descent converges under convexity assumptions. % this is a comment\nLearning rate controls step size.";
        assert_eq!(
            preprocess(raw),
            "Gradient descent converges under convexity assumptions. Learning rate controls step size."
        );
    }

    #[test]
    fn test_full_line_comments() {
        let raw = "% header comment\n\\section{Intro}\n%another\nBody";
        assert_eq!(preprocess(raw), "\\section{Intro} Body");
    }

    #[test]
    fn test_escaped_percent_kept() {
        assert_eq!(preprocess("accuracy of 95\\% overall"), "accuracy of 95\\% overall");
        assert_eq!(preprocess("95\\% here % but not this"), "95\\% here");
    }

    #[test]
    fn test_comment_directly_after_text() {
        assert_eq!(preprocess("word%comment\nnext"), "word next");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(preprocess("  a \t\t b\n\n\nc  "), "a b c");
    }

    #[test]
    fn test_empty_and_comment_only() {
        assert_eq!(preprocess(""), "");
        assert_eq!(preprocess("% only a comment\n   \n"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Plain text.",
            "a % b\nc",
            "95\\% done %todo\n\n  \\begin{equation} x^2 \\end{equation}",
            "ünïcödé   text % коммент\nстрока",
            "%%%\n%",
        ];

        for raw in samples {
            let once = preprocess(raw);
            assert_eq!(preprocess(&once), once, "not idempotent for {:?}", raw);
        }
    }
}
