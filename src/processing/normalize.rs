//! Whitespace normalization and length capping for extracted document text.

/// Default character cap applied before prompting.
pub const DEFAULT_MAX_CHARS: usize = 4000;

/// Collapse whitespace runs to single spaces, trim, and cap the result at `max_chars`.
///
/// Length is measured in `char`s, which only approximates the provider's token budget. The cap
/// is applied after trimming, so a cut may end on a separator space.
pub fn normalize_text(raw: &str, max_chars: usize) -> String {
    let mut normalized = String::with_capacity(raw.len().min(max_chars.saturating_mul(4)));
    for (index, word) in raw.split_whitespace().enumerate() {
        if index > 0 {
            normalized.push(' ');
        }
        normalized.push_str(word);
    }

    match normalized.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            normalized.truncate(cut);
            normalized
        }
        None => normalized,
    }
}
