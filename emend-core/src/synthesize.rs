//! Turns diff operations into located `Correction` records.
//!
//! A cursor walks the original text. Equal spans advance it; a maximal run of
//! non-equal operations becomes exactly one correction:
//!
//! | run contains            | change type    | span                       |
//! |-------------------------|----------------|----------------------------|
//! | deletions only          | `deletion`     | `[cursor, cursor + len)`   |
//! | insertions only         | `addition`     | `[cursor, cursor)`         |
//! | deletions + insertions  | `modification` | the deleted span           |
//!
//! Inserted text never advances the cursor: it does not exist in the
//! original coordinate space.

use tracing::debug;

use crate::diff::{self, DiffOperation, DiffOptions};
use crate::error::EngineError;
use crate::normalize::normalize;
use crate::text::{char_len, char_slice, splice};
use crate::types::{ChangeType, Correction, CorrectionStatus};

/// Identifies the paragraph corrections are emitted for.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphRef<'a> {
    pub paragraph_id: &'a str,
    pub paragraph_number: u32,
}

#[derive(Debug, Default)]
struct EditRun {
    start: usize,
    deleted: String,
    inserted: String,
}

/// Walks `ops` over `original` and emits one correction per edit run.
///
/// `ops` must reconstruct `original` on its original side.
pub fn synthesize(target: ParagraphRef<'_>, original: &str, ops: &[DiffOperation]) -> Vec<Correction> {
    let mut corrections = Vec::new();
    let mut cursor = 0;
    let mut run: Option<EditRun> = None;

    for op in ops {
        match op {
            DiffOperation::Equal(text) => {
                if let Some(done) = run.take() {
                    corrections.push(build(target, original, corrections.len(), done));
                }
                cursor += char_len(text);
            }
            DiffOperation::Delete(text) => {
                run.get_or_insert_with(|| EditRun { start: cursor, ..EditRun::default() })
                    .deleted
                    .push_str(text);
                cursor += char_len(text);
            }
            DiffOperation::Insert(text) => {
                run.get_or_insert_with(|| EditRun { start: cursor, ..EditRun::default() })
                    .inserted
                    .push_str(text);
            }
        }
    }
    if let Some(done) = run.take() {
        corrections.push(build(target, original, corrections.len(), done));
    }
    corrections
}

fn build(target: ParagraphRef<'_>, original: &str, index: usize, run: EditRun) -> Correction {
    let end = run.start + char_len(&run.deleted);
    let (change_type, diff_text) = match (run.deleted.is_empty(), run.inserted.is_empty()) {
        (false, true) => (ChangeType::Deletion, run.deleted.clone()),
        (true, _) => (ChangeType::Addition, run.inserted.clone()),
        (false, false) => (ChangeType::Modification, run.inserted.clone()),
    };
    let suggestion = suggestion(change_type, &diff_text, &run.deleted);
    let mut correction = Correction {
        id: format!("{}-{}", target.paragraph_id, index),
        paragraph_id: target.paragraph_id.to_owned(),
        paragraph_number: target.paragraph_number,
        original_text: original.to_owned(),
        corrected_text: String::new(),
        change_type,
        diff_text,
        replaced_text: run.deleted,
        start_offset: run.start,
        end_offset: end,
        suggestion,
        status: CorrectionStatus::Pending,
    };
    correction.corrected_text = splice(original, run.start, end, correction.replacement());
    correction
}

/// Human-readable one-liner for a correction.
pub fn suggestion(change_type: ChangeType, diff_text: &str, replaced_text: &str) -> String {
    match change_type {
        ChangeType::Addition => format!("Add \"{}\"", display_text(diff_text)),
        ChangeType::Deletion => format!("Delete \"{}\"", display_text(diff_text)),
        ChangeType::Modification => format!(
            "Change \"{}\" to \"{}\"",
            display_text(replaced_text),
            display_text(diff_text)
        ),
    }
}

fn display_text(text: &str) -> &str {
    if char_len(text) == 1 {
        return text;
    }
    match text.trim() {
        "" => text,
        trimmed => trimmed,
    }
}

/// Computes the corrections that turn `original` into the normalized `edited`.
///
/// Short-circuits with no corrections when both sides normalize to the same
/// text. Leading and trailing whitespace of `original` is never edited: the
/// diff runs on the trimmed core and offsets still index the full text.
///
/// # Errors
///
/// Returns `EngineError::Diff` if the diff breaks the round-trip law and
/// `EngineError::OffsetsOutOfRange` if a correction falls outside `original`.
pub fn correct_paragraph(
    target: ParagraphRef<'_>,
    original: &str,
    edited: &str,
    options: &DiffOptions,
) -> Result<Vec<Correction>, EngineError> {
    let corrected = normalize(edited);
    if normalize(original) == corrected {
        return Ok(Vec::new());
    }

    let core = original.trim();
    let leading = &original[..original.len() - original.trim_start().len()];
    // A whitespace-only original is all leading run.
    let trailing = if core.is_empty() {
        ""
    } else {
        &original[original.trim_end().len()..]
    };

    let mut ops = Vec::with_capacity(4);
    if !leading.is_empty() {
        ops.push(DiffOperation::Equal(leading.to_owned()));
    }
    ops.extend(diff::checked_diff(core, &corrected, options)?);
    if !trailing.is_empty() {
        ops.push(DiffOperation::Equal(trailing.to_owned()));
    }
    diff::verify(&ops, original, &format!("{leading}{corrected}{trailing}"))?;

    let corrections = synthesize(target, original, &ops);
    let len = char_len(original);
    if let Some(bad) = corrections.iter().find(|c| c.end_offset > len || c.start_offset > c.end_offset) {
        return Err(EngineError::OffsetsOutOfRange {
            id: bad.id.clone(),
            start: bad.start_offset,
            end: bad.end_offset,
            len,
        });
    }
    debug!(
        paragraph = target.paragraph_id,
        corrections = corrections.len(),
        "synthesized corrections"
    );
    Ok(corrections)
}

/// Moves `sibling` onto `new_text` after `applied` changed the same paragraph.
///
/// When `new_text` is exactly what `applied` predicted, offsets shift by the
/// applied length change. Otherwise the span is mapped through a diff of the
/// old and new text, and a mapped addition must keep text on one side of its
/// insertion point. Returns `false`, leaving `sibling` untouched, when the
/// span can no longer be found intact.
pub fn rebase(sibling: &mut Correction, applied: &Correction, new_text: &str, options: &DiffOptions) -> bool {
    if sibling.original_text == new_text {
        return true;
    }

    let predicted = sibling.original_text == applied.original_text && new_text == applied.corrected_text;
    let located = if predicted {
        let delta = char_len(applied.replacement()) as isize - applied.span_len() as isize;
        if sibling.start_offset >= applied.end_offset {
            Some((
                sibling.start_offset.saturating_add_signed(delta),
                sibling.end_offset.saturating_add_signed(delta),
            ))
        } else if sibling.end_offset <= applied.start_offset {
            Some((sibling.start_offset, sibling.end_offset))
        } else {
            None
        }
    } else {
        let ops = diff::diff_with(&sibling.original_text, new_text, options);
        let start = diff::map_position(&ops, sibling.start_offset);
        let end = match sibling.change_type {
            ChangeType::Addition => start,
            _ => diff::map_position(&ops, sibling.end_offset),
        };
        Some((start, end))
    };

    let Some((start, end)) = located else {
        return false;
    };
    if end < start || end > char_len(new_text) || char_slice(new_text, start, end) != sibling.replaced_text {
        return false;
    }
    if !predicted && sibling.change_type == ChangeType::Addition && !anchor_survives(sibling, new_text, start) {
        return false;
    }

    sibling.start_offset = start;
    sibling.end_offset = end;
    sibling.original_text = new_text.to_owned();
    sibling.corrected_text = splice(new_text, start, end, sibling.replacement());
    true
}

/// Code points compared on each side of a rebased addition point.
const ANCHOR_CONTEXT: usize = 3;

/// An addition has no text of its own to check, so at least one non-empty
/// side of its insertion point must read the same in `new_text`.
fn anchor_survives(sibling: &Correction, new_text: &str, at: usize) -> bool {
    let old = sibling.original_text.as_str();
    let old_at = sibling.start_offset;
    let before = char_slice(old, old_at.saturating_sub(ANCHOR_CONTEXT), old_at);
    let after = char_slice(old, old_at, (old_at + ANCHOR_CONTEXT).min(char_len(old)));
    if before.is_empty() && after.is_empty() {
        return true;
    }

    let new_len = char_len(new_text);
    let before_held = !before.is_empty()
        && at >= char_len(before)
        && char_slice(new_text, at - char_len(before), at) == before;
    let after_held = !after.is_empty()
        && at + char_len(after) <= new_len
        && char_slice(new_text, at, at + char_len(after)) == after;
    before_held || after_held
}
