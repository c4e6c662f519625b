//! Code-point addressing helpers.
//!
//! Every offset the engine exposes counts Unicode scalar values, not bytes.
//! These helpers translate between the two so no caller slices a `str` by
//! character index directly.

/// Collapses every whitespace run to a single space and trims both ends.
///
/// Used only for comparisons; never for producing offsets.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-insensitive equality.
pub fn same_collapsed(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_idx`-th code point, or `text.len()` past the end.
pub fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// The code points in `[start, end)`, clamped to the text.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    &text[from..to]
}

/// Returns `text` with `[start, end)` replaced by `replacement`.
pub fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..from]);
    out.push_str(replacement);
    out.push_str(&text[to..]);
    out
}

/// Start offsets (in code points) of every non-overlapping occurrence of
/// `needle`, scanning left to right.
pub fn find_all(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();
    let mut chars_before = 0;
    let mut consumed = 0;
    for (byte_idx, _) in haystack.match_indices(needle) {
        chars_before += char_len(&haystack[consumed..byte_idx]);
        hits.push(chars_before);
        consumed = byte_idx;
    }
    hits
}
