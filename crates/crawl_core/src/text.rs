use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalizes `text`, trims every line, drops blank lines and repeated lines.
///
/// The first occurrence of a line keeps its position.
pub fn clean_text(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    let lines: Vec<&str> = split_lines(&normalized)
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    deduplicate_lines(&lines.join("\n"))
}

/// Removes repeated lines, keeping the first occurrence of each.
pub fn deduplicate_lines(text: &str) -> String {
    let mut seen = HashSet::new();
    split_lines(text)
        .into_iter()
        .filter(|line| seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits on every Unicode line boundary, treating `\r\n` as one.
/// A trailing boundary does not produce an empty last line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !is_line_boundary(ch) {
            continue;
        }
        lines.push(&text[start..idx]);
        let mut end = idx + ch.len_utf8();
        if ch == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
            chars.next();
            end += 1;
        }
        start = end;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_boundary(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}
