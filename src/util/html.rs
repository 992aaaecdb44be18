//! Plain-text helpers for rich-text fields.

/// Remove anything that looks like an opening or closing tag.
///
/// A `<` without a matching `>` is kept as text.
pub fn strip_tags(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if close > 0 => {
                rest = &after[close + 1..];
            }
            _ => {
                output.push('<');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
