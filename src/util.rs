// src/util.rs — Text helpers for terminal columns and log lines

/// Squash `text` onto one line and cap it at `max_chars` characters.
///
/// Niches and drafted lines come from hand-edited documents and model
/// replies, so they can carry newlines or runs of spaces that would break a
/// progress column. Whitespace runs become a single space. A clipped result
/// ends in `…`, which counts toward `max_chars`.
pub fn one_line(text: &str, max_chars: usize) -> String {
    let mut words = text.split_whitespace();
    let mut out = String::new();
    if let Some(first) = words.next() {
        out.push_str(first);
        for w in words {
            out.push(' ');
            out.push_str(w);
        }
    }

    if out.chars().count() <= max_chars {
        return out;
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut clipped: String = out.chars().take(max_chars - 1).collect();
    clipped.push('…');
    clipped
}
