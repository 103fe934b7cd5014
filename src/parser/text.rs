use std::sync::LazyLock;

use regex::Regex;

/// Rewrite backslash separators when normalization is on.
pub fn normalize_path(path: &str, normalize: bool) -> String {
    if normalize {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Keep at most `limit` characters, appending `...` when something was cut.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// CSI sequences (colors, cursor moves) and two-byte escapes.
static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b(?:\[[0-9;?]*[ -/]*[@-~]|[@-Z\\-_])").ok());

/// Remove terminal escape sequences that reporters leave in error text.
pub fn strip_ansi(s: &str) -> String {
    match ANSI_ESCAPE.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// First non-blank line, trimmed.
pub fn first_line(s: &str) -> &str {
    s.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(normalize_path("a\\b\\c.js", true), "a/b/c.js");
        assert_eq!(normalize_path("a\\b\\c.js", false), "a\\b\\c.js");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("hi", 2), "hi");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi("\x1b[31mexpected\x1b[39m 1"), "expected 1");
        assert_eq!(strip_ansi("\x1b[1;32m✓\x1b[0m ok\x1b[2K"), "✓ ok");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }

    #[test]
    fn first_line_skips_blank() {
        assert_eq!(first_line("\n  \n  Error: boom \n at x"), "Error: boom");
    }
}
