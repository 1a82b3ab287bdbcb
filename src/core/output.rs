//! Compact output rendering helpers for CLI surfaces.
//!
//! Keeps catalog excerpts and selection summaries bounded and readable.

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// First `max_lines` non-empty body lines, each compacted, for `catalog show`.
pub fn excerpt(body: &str, max_lines: usize, max_chars: usize) -> String {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(max_lines)
        .map(|l| compact_line(l, max_chars))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_line_bounds_length() {
        let long = "word ".repeat(50);
        let line = compact_line(&long, 20);
        assert!(line.len() <= 23);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn test_excerpt_skips_blank_lines() {
        let body = "# Title\n\nFirst point.\n\nSecond point.\n";
        let e = excerpt(body, 2, 80);
        assert_eq!(e, "# Title\nFirst point.");
    }
}
