//! Markup stripping for edited paragraph text.
//!
//! Edited sources carry three tag families that never belong in the document:
//!
//! - block/style tags `<{name}>`, together with any whitespace right after them
//! - inline formatting tags `<[name]>` and `<[/name]>`
//! - bare bracket annotations `[name]` / `[/name]`
//!
//! Stripping repeats until nothing matches, so tags assembled from the
//! remains of an inner tag (`<{<{x}>y}>`) are removed as well and
//! `normalize(normalize(x)) == normalize(x)` holds for every input.
//! Internal whitespace is left alone; see [`crate::text::collapse_whitespace`].

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\{[A-Za-z0-9_:\-]+\}>\s*").expect("valid block tag pattern"));
static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\[/?[A-Za-z0-9_:\-]+\]>").expect("valid inline tag pattern"));
// Must start with a letter so numeric references like "[12]" survive.
static BRACKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[/?[A-Za-z][A-Za-z0-9_:\-]*\]").expect("valid bracket pattern"));

/// Strips markup tags and trims surrounding whitespace.
pub fn normalize(text: &str) -> String {
    let mut current = text.to_owned();
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_owned()
}

fn strip_once(text: &str) -> String {
    let text = BLOCK_TAG.replace_all(text, "");
    let text = INLINE_TAG.replace_all(&text, "");
    BRACKET_TAG.replace_all(&text, "").into_owned()
}
