//! Helpers shared by the workspace's integration tests: readable line diffs and
//! TOML-described editing scenarios.

mod scenario;

pub use scenario::{Expectation, Scenario, ScenarioFile, Step, User, load_scenarios};

use std::fmt::Write;

const MISSING: &str = "<missing>";
const CONTEXT: usize = 2;

/// Makes quotes and control characters visible in assertion messages.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn line_at(lines: &[String], index: usize) -> &str {
    lines.get(index).map(String::as_str).unwrap_or(MISSING)
}

/// Side-by-side excerpt around the first differing line, for assertion messages.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let longest = expected.len().max(actual.len());
    let first = (0..longest).find(|&i| line_at(expected, i) != line_at(actual, i));
    let mut out = String::new();
    if let Some(first) = first {
        let window = first.saturating_sub(CONTEXT)..(first + CONTEXT + 1).min(longest);
        let _ = writeln!(
            out,
            "first mismatch at line {} (showing {}..={}):",
            first + 1,
            window.start + 1,
            window.end
        );
        for i in window {
            let marker = if i == first { '>' } else { ' ' };
            let _ = writeln!(out, "{marker} {:>4}  expected: {}", i + 1, line_at(expected, i));
            let _ = writeln!(out, "{marker} {:>4}    actual: {}", i + 1, line_at(actual, i));
        }
    }
    let _ = writeln!(out, "expected {} lines, actual {} lines", expected.len(), actual.len());
    out
}

/// Splits serialized markup after every closing block tag so diffs point at the
/// paragraph that differs.
pub fn html_lines(html: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut rest = html;
    while let Some(pos) = rest.find("</") {
        let Some(end) = rest[pos..].find('>') else {
            break;
        };
        let tag_end = pos + end + 1;
        let name = &rest[pos + 2..pos + end];
        current.push_str(&rest[..tag_end]);
        rest = &rest[tag_end..];
        if matches!(name, "p" | "div" | "li" | "ul" | "ol" | "blockquote" | "h1" | "h2" | "h3") {
            lines.push(std::mem::take(&mut current));
        }
    }
    current.push_str(rest);
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_lines_breaks_after_blocks() {
        assert_eq!(
            html_lines("<p>a<em>b</em></p><p>c</p>tail"),
            ["<p>a<em>b</em></p>", "<p>c</p>", "tail"]
        );
    }

    #[test]
    fn diff_lines_reports_first_mismatch() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string(), "c".to_string()];
        let diff = diff_lines(&expected, &actual);
        assert!(diff.contains("first mismatch at line 2"), "{diff}");
    }

    #[test]
    fn escape_text_makes_control_chars_visible() {
        assert_eq!(escape_text("a\n\"b\u{1}"), "a\\n\\\"b\\u{01}");
    }
}
