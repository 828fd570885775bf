//! Splits a raw summary completion into a paragraph and a bullet list.
//!
//! The model is asked for one paragraph, a blank line, then dash-prefixed bullets. Nothing
//! guarantees that shape, so parsing is lenient: the first blank line (possibly containing
//! spaces) separates the paragraph from the bullet block, and within the block only lines that
//! start with a list marker become bullets. When no bullet survives, the list stays empty
//! rather than being synthesized from arbitrary lines.

use crate::processing::types::ParsedSummary;

/// Parse a completion into paragraph and bullets.
///
/// Callers are expected to reject blank completions beforehand; a blank input yields an
/// empty paragraph and no bullets.
pub fn parse_bullet_summary(content: &str) -> ParsedSummary {
    let content = content.trim();
    let (paragraph_part, bullet_block) = split_first_blank_line(content);

    let bullets: Vec<String> = bullet_block
        .map(|block| block.lines().filter_map(strip_bullet_marker).collect())
        .unwrap_or_default();

    let paragraph = paragraph_part.trim();
    let paragraph = if paragraph.is_empty() {
        content
    } else {
        paragraph
    };

    if bullets.is_empty() {
        tracing::warn!(
            paragraph_chars = paragraph.chars().count(),
            has_bullet_block = bullet_block.is_some(),
            "No bullet points parsed from completion"
        );
    } else {
        tracing::debug!(bullets = bullets.len(), "Parsed bullet points");
    }

    ParsedSummary {
        paragraph: paragraph.to_string(),
        bullets,
    }
}

/// Split `content` at the first run of blank lines.
///
/// Returns the text before the separator and, when a separator exists, the text after it.
fn split_first_blank_line(content: &str) -> (&str, Option<&str>) {
    let mut offset = 0usize;
    let mut separator_start = None;

    for line in content.split_inclusive('\n') {
        let is_blank = line.trim().is_empty();
        match separator_start {
            None if is_blank && offset > 0 => separator_start = Some(offset),
            Some(start) if !is_blank => {
                return (&content[..start], Some(&content[offset..]));
            }
            _ => {}
        }
        offset += line.len();
    }

    match separator_start {
        Some(start) => (&content[..start], None),
        None => (content, None),
    }
}

/// Strip a leading list marker (`-`, `•`, or an enumeration such as `1.`) from a line.
///
/// Lines without a marker, or with nothing after it, are not bullets.
fn strip_bullet_marker(line: &str) -> Option<String> {
    let line = line.trim();
    let rest = line.trim_start_matches(is_marker_char);
    if rest.len() == line.len() {
        return None;
    }
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn is_marker_char(ch: char) -> bool {
    matches!(ch, '-' | '•' | '.' | ' ') || ch.is_ascii_digit()
}
