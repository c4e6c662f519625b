//! Character-level diff with human-oriented cleanup.
//!
//! # Pipeline
//!
//! 1. Strip the common prefix and suffix. This is the tie-break policy: among
//!    equally short edit scripts the one with the longest leading equal run
//!    wins, independent of how the aligner breaks ties internally.
//! 2. Align the middle with Myers over code points (`similar`).
//! 3. Semantic cleanup: fold short equalities that are dominated by the edits
//!    around them, slide lone edits onto word boundaries, and split out
//!    overlaps between a deletion and the insertion that follows it.
//! 4. Efficiency cleanup: fold equalities shorter than `edit_cost` that sit
//!    between enough edits, trading a few extra characters for fewer spans.
//!
//! The two cleanups run in that order; efficiency assumes semantic output.
//!
//! The output is in original-text order, contains no empty operations, and
//! satisfies the round-trip law checked by [`verify`].

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag};

use crate::error::EngineError;

/// One span of a diff between an original and an edited string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "text", rename_all = "lowercase")]
pub enum DiffOperation {
    Equal(String),
    Insert(String),
    Delete(String),
}

impl DiffOperation {
    pub fn text(&self) -> &str {
        match self {
            DiffOperation::Equal(t) | DiffOperation::Insert(t) | DiffOperation::Delete(t) => t,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, DiffOperation::Equal(_))
    }
}

/// Concatenation of Equal and Delete spans: the original string.
pub fn original_side(ops: &[DiffOperation]) -> String {
    ops.iter()
        .filter(|op| !matches!(op, DiffOperation::Insert(_)))
        .map(DiffOperation::text)
        .collect()
}

/// Concatenation of Equal and Insert spans: the edited string.
pub fn edited_side(ops: &[DiffOperation]) -> String {
    ops.iter()
        .filter(|op| !matches!(op, DiffOperation::Delete(_)))
        .map(DiffOperation::text)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Cost of an extra edit span, in characters, for efficiency cleanup.
    pub edit_cost: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { edit_cost: 4 }
    }
}

/// Shortest deletion/insertion overlap worth splitting out as an equality.
/// A single shared character (a transposition like "ie" → "ei") stays one edit.
const MIN_OVERLAP: usize = 2;

/// Diffs `a` against `b` with default options.
pub fn diff(a: &str, b: &str) -> Vec<DiffOperation> {
    diff_with(a, b, &DiffOptions::default())
}

pub fn diff_with(a: &str, b: &str, options: &DiffOptions) -> Vec<DiffOperation> {
    let old: Vec<char> = a.chars().collect();
    let new: Vec<char> = b.chars().collect();

    let mut chunks = align(&old, &new);
    cleanup_merge(&mut chunks);
    cleanup_semantic(&mut chunks);
    cleanup_efficiency(&mut chunks, options.edit_cost);
    coalesce(&mut chunks);

    chunks.into_iter().map(Chunk::into_operation).collect()
}

/// Diffs and checks the round-trip law before returning.
///
/// # Errors
///
/// Returns `EngineError::Diff` if either side fails to reconstruct its input.
pub fn checked_diff(a: &str, b: &str, options: &DiffOptions) -> Result<Vec<DiffOperation>, EngineError> {
    let ops = diff_with(a, b, options);
    verify(&ops, a, b)?;
    Ok(ops)
}

/// Verifies that `ops` reconstructs `original` and `edited` exactly.
pub fn verify(ops: &[DiffOperation], original: &str, edited: &str) -> Result<(), EngineError> {
    if original_side(ops) != original {
        return Err(EngineError::Diff(format!(
            "original side does not reconstruct {original:?}"
        )));
    }
    if edited_side(ops) != edited {
        return Err(EngineError::Diff(format!(
            "edited side does not reconstruct {edited:?}"
        )));
    }
    Ok(())
}

/// Maps a code-point position in the original string to the edited string.
///
/// Positions inside a deleted span collapse to the point where the deletion
/// was. A position at the boundary before an insertion stays before it.
pub fn map_position(ops: &[DiffOperation], position: usize) -> usize {
    let mut old_pos = 0;
    let mut new_pos = 0;
    for op in ops {
        let len = op.text().chars().count();
        match op {
            DiffOperation::Equal(_) => {
                if position <= old_pos + len {
                    return new_pos + (position - old_pos);
                }
                old_pos += len;
                new_pos += len;
            }
            DiffOperation::Delete(_) => {
                if position < old_pos + len {
                    return new_pos;
                }
                old_pos += len;
            }
            DiffOperation::Insert(_) => new_pos += len,
        }
    }
    new_pos + position.saturating_sub(old_pos)
}

// ---------------------------------------------------------------------------
// Working representation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    op: Op,
    text: Vec<char>,
}

impl Chunk {
    fn new(op: Op, text: Vec<char>) -> Self {
        Self { op, text }
    }

    fn into_operation(self) -> DiffOperation {
        let text: String = self.text.into_iter().collect();
        match self.op {
            Op::Equal => DiffOperation::Equal(text),
            Op::Insert => DiffOperation::Insert(text),
            Op::Delete => DiffOperation::Delete(text),
        }
    }
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap(a: &[char], b: &[char]) -> usize {
    let max = a.len().min(b.len());
    (1..=max)
        .rev()
        .find(|&k| a[a.len() - k..] == b[..k])
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

fn align(old: &[char], new: &[char]) -> Vec<Chunk> {
    let prefix = common_prefix(old, new);
    let suffix = common_suffix(&old[prefix..], &new[prefix..]);
    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut chunks = Vec::new();
    if prefix > 0 {
        chunks.push(Chunk::new(Op::Equal, old[..prefix].to_vec()));
    }

    if old_mid.is_empty() && !new_mid.is_empty() {
        chunks.push(Chunk::new(Op::Insert, new_mid.to_vec()));
    } else if new_mid.is_empty() && !old_mid.is_empty() {
        chunks.push(Chunk::new(Op::Delete, old_mid.to_vec()));
    } else if !old_mid.is_empty() {
        for op in similar::capture_diff_slices(Algorithm::Myers, old_mid, new_mid) {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => chunks.push(Chunk::new(Op::Equal, old_mid[old_range].to_vec())),
                DiffTag::Delete => chunks.push(Chunk::new(Op::Delete, old_mid[old_range].to_vec())),
                DiffTag::Insert => chunks.push(Chunk::new(Op::Insert, new_mid[new_range].to_vec())),
                DiffTag::Replace => {
                    chunks.push(Chunk::new(Op::Delete, old_mid[old_range].to_vec()));
                    chunks.push(Chunk::new(Op::Insert, new_mid[new_range].to_vec()));
                }
            }
        }
    }

    if suffix > 0 {
        chunks.push(Chunk::new(Op::Equal, old[old.len() - suffix..].to_vec()));
    }
    chunks.retain(|c| !c.text.is_empty());
    chunks
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Normalizes a chunk list: one Delete then one Insert between equalities,
/// shared prefixes/suffixes of a replacement moved into the equalities, and
/// lone edits slid rightward where that swallows the following equality.
///
/// Edits are never slid leftward; that would shorten the leading equal run.
fn cleanup_merge(chunks: &mut Vec<Chunk>) {
    loop {
        merge_runs(chunks);
        if !shift_edits_right(chunks) {
            break;
        }
    }
}

fn merge_runs(chunks: &mut Vec<Chunk>) {
    chunks.push(Chunk::new(Op::Equal, Vec::new()));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();

    while pointer < chunks.len() {
        match chunks[pointer].op {
            Op::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&chunks[pointer].text);
                pointer += 1;
            }
            Op::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&chunks[pointer].text);
                pointer += 1;
            }
            Op::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let prefix = common_prefix(&text_insert, &text_delete);
                        if prefix != 0 {
                            let run_start = pointer - count_delete - count_insert;
                            if run_start > 0 && chunks[run_start - 1].op == Op::Equal {
                                chunks[run_start - 1].text.extend_from_slice(&text_insert[..prefix]);
                            } else {
                                chunks.insert(0, Chunk::new(Op::Equal, text_insert[..prefix].to_vec()));
                                pointer += 1;
                            }
                            text_insert.drain(..prefix);
                            text_delete.drain(..prefix);
                        }
                        let suffix = common_suffix(&text_insert, &text_delete);
                        if suffix != 0 {
                            let mut moved = text_insert.split_off(text_insert.len() - suffix);
                            text_delete.truncate(text_delete.len() - suffix);
                            moved.extend_from_slice(&chunks[pointer].text);
                            chunks[pointer].text = moved;
                        }
                    }
                    let run_start = pointer - count_delete - count_insert;
                    let mut replacement = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        replacement.push(Chunk::new(Op::Delete, std::mem::take(&mut text_delete)));
                    }
                    if !text_insert.is_empty() {
                        replacement.push(Chunk::new(Op::Insert, std::mem::take(&mut text_insert)));
                    }
                    let added = replacement.len();
                    chunks.splice(run_start..pointer, replacement);
                    pointer = run_start + added + 1;
                } else if pointer != 0 && chunks[pointer - 1].op == Op::Equal {
                    let text = chunks.remove(pointer).text;
                    chunks[pointer - 1].text.extend(text);
                } else {
                    pointer += 1;
                }
                count_delete = 0;
                count_insert = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    coalesce(chunks);
}

/// Drops empty chunks and joins neighbours of the same kind.
fn coalesce(chunks: &mut Vec<Chunk>) {
    let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks.drain(..) {
        if chunk.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.op == chunk.op => last.text.extend(chunk.text),
            _ => out.push(chunk),
        }
    }
    *chunks = out;
}

/// `Equal(x) Edit(ab) Equal(a…)` becomes `Equal(xa) Edit(ba) Equal(…)`.
fn shift_edits_right(chunks: &mut Vec<Chunk>) -> bool {
    let mut changed = false;
    let mut pointer = 1;
    while pointer + 1 < chunks.len() {
        if chunks[pointer - 1].op == Op::Equal
            && chunks[pointer + 1].op == Op::Equal
            && chunks[pointer].op != Op::Equal
        {
            let next = chunks[pointer + 1].text.clone();
            if !next.is_empty() && chunks[pointer].text.starts_with(&next) {
                chunks[pointer - 1].text.extend_from_slice(&next);
                let mut shifted = chunks[pointer].text[next.len()..].to_vec();
                shifted.extend_from_slice(&next);
                chunks[pointer].text = shifted;
                chunks.remove(pointer + 1);
                changed = true;
            }
        }
        pointer += 1;
    }
    changed
}

// ---------------------------------------------------------------------------
// Semantic cleanup
// ---------------------------------------------------------------------------

fn cleanup_semantic(chunks: &mut Vec<Chunk>) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    let mut pointer = 0;
    // Edit lengths before and after the last equality.
    let (mut ins_before, mut del_before) = (0usize, 0usize);
    let (mut ins_after, mut del_after) = (0usize, 0usize);

    while pointer < chunks.len() {
        if chunks[pointer].op == Op::Equal {
            equalities.push(pointer);
            ins_before = ins_after;
            del_before = del_after;
            ins_after = 0;
            del_after = 0;
            last_equality = Some(chunks[pointer].text.len());
            pointer += 1;
            continue;
        }

        if chunks[pointer].op == Op::Insert {
            ins_after += chunks[pointer].text.len();
        } else {
            del_after += chunks[pointer].text.len();
        }

        let dominated = last_equality.is_some_and(|len| {
            len <= ins_before.max(del_before) && len <= ins_after.max(del_after)
        });
        if let (true, Some(&eq_idx)) = (dominated, equalities.last()) {
            // Replace the equality with a delete+insert of the same text.
            let text = chunks[eq_idx].text.clone();
            chunks.insert(eq_idx, Chunk::new(Op::Delete, text));
            chunks[eq_idx + 1].op = Op::Insert;
            equalities.pop();
            // The equality before it needs re-evaluating too.
            equalities.pop();
            pointer = equalities.last().map_or(0, |&p| p + 1);
            ins_before = 0;
            del_before = 0;
            ins_after = 0;
            del_after = 0;
            last_equality = None;
            changed = true;
            continue;
        }
        pointer += 1;
    }

    if changed {
        cleanup_merge(chunks);
    }
    cleanup_semantic_lossless(chunks);
    split_overlaps(chunks);
}

/// Slides each lone edit between two equalities to the position that scores
/// best as a word or sentence boundary. Ties go to the rightmost position.
///
/// An edit right after the leading equality only slides right: the leading
/// run produced by prefix stripping is never shortened.
fn cleanup_semantic_lossless(chunks: &mut Vec<Chunk>) {
    let mut pointer = 1;
    while pointer + 1 < chunks.len() {
        if chunks[pointer - 1].op != Op::Equal || chunks[pointer + 1].op != Op::Equal {
            pointer += 1;
            continue;
        }

        let mut equality1 = chunks[pointer - 1].text.clone();
        let mut edit = chunks[pointer].text.clone();
        let mut equality2 = chunks[pointer + 1].text.clone();

        // Slide as far left as possible first.
        let offset = if pointer == 1 { 0 } else { common_suffix(&equality1, &edit) };
        if offset > 0 {
            let common = edit[edit.len() - offset..].to_vec();
            equality1.truncate(equality1.len() - offset);
            let mut shifted = common.clone();
            shifted.extend_from_slice(&edit[..edit.len() - offset]);
            edit = shifted;
            let mut tail = common;
            tail.extend_from_slice(&equality2);
            equality2 = tail;
        }

        // A position that empties the leading equality is never a candidate.
        let mut best = None;
        let mut best_score = 0;
        if !equality1.is_empty() {
            best_score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            best = Some((equality1.clone(), edit.clone(), equality2.clone()));
        }
        while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
            equality1.push(edit[0]);
            edit.remove(0);
            edit.push(equality2.remove(0));
            let score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            if best.is_none() || score >= best_score {
                best_score = score;
                best = Some((equality1.clone(), edit.clone(), equality2.clone()));
            }
        }

        let Some((best_eq1, best_edit, best_eq2)) = best else {
            pointer += 1;
            continue;
        };
        if chunks[pointer - 1].text != best_eq1 {
            chunks[pointer - 1].text = best_eq1;
            chunks[pointer].text = best_edit;
            if best_eq2.is_empty() {
                chunks.remove(pointer + 1);
            } else {
                chunks[pointer + 1].text = best_eq2;
            }
        }
        pointer += 1;
    }
}

/// Scores the boundary between `one` and `two`: 6 at an edge of the text,
/// 5 blank line, 4 line break, 3 end of sentence, 2 whitespace,
/// 1 punctuation, 0 inside a word.
fn boundary_score(one: &[char], two: &[char]) -> u32 {
    let (Some(&c1), Some(&c2)) = (one.last(), two.first()) else {
        return 6;
    };
    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let space1 = non_alnum1 && c1.is_whitespace();
    let space2 = non_alnum2 && c2.is_whitespace();
    let break1 = space1 && (c1 == '\n' || c1 == '\r');
    let break2 = space2 && (c2 == '\n' || c2 == '\r');
    let blank1 = break1 && ends_with_blank_line(one);
    let blank2 = break2 && starts_with_blank_line(two);

    if blank1 || blank2 {
        5
    } else if break1 || break2 {
        4
    } else if non_alnum1 && !space1 && space2 {
        3
    } else if space1 || space2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

fn ends_with_blank_line(text: &[char]) -> bool {
    let trimmed: Vec<char> = text.iter().rev().take(3).copied().collect();
    matches!(trimmed.as_slice(), ['\n', '\n', ..] | ['\n', '\r', '\n'])
}

fn starts_with_blank_line(text: &[char]) -> bool {
    matches!(text, ['\n', '\n', ..] | ['\n', '\r', '\n', ..] | ['\r', '\n', '\n', ..] | ['\r', '\n', '\r', '\n', ..])
}

/// Turns `Delete(abcxx) Insert(xxdef)` into `Delete(abc) Equal(xx) Insert(def)`
/// when the overlap is at least half of either side.
fn split_overlaps(chunks: &mut Vec<Chunk>) {
    let mut pointer = 1;
    while pointer < chunks.len() {
        if chunks[pointer - 1].op == Op::Delete && chunks[pointer].op == Op::Insert {
            let deletion = chunks[pointer - 1].text.clone();
            let insertion = chunks[pointer].text.clone();
            let forward = common_overlap(&deletion, &insertion);
            let reverse = common_overlap(&insertion, &deletion);
            if forward >= reverse {
                if forward >= MIN_OVERLAP
                    && (forward * 2 >= deletion.len() || forward * 2 >= insertion.len())
                {
                    chunks.insert(pointer, Chunk::new(Op::Equal, insertion[..forward].to_vec()));
                    chunks[pointer - 1].text = deletion[..deletion.len() - forward].to_vec();
                    chunks[pointer + 1].text = insertion[forward..].to_vec();
                    pointer += 1;
                }
            } else if reverse >= MIN_OVERLAP
                && (reverse * 2 >= deletion.len() || reverse * 2 >= insertion.len())
            {
                chunks.insert(pointer, Chunk::new(Op::Equal, deletion[..reverse].to_vec()));
                chunks[pointer - 1] = Chunk::new(Op::Insert, insertion[..insertion.len() - reverse].to_vec());
                chunks[pointer + 1] = Chunk::new(Op::Delete, deletion[reverse..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
    chunks.retain(|c| !c.text.is_empty());
}

// ---------------------------------------------------------------------------
// Efficiency cleanup
// ---------------------------------------------------------------------------

fn cleanup_efficiency(chunks: &mut Vec<Chunk>, edit_cost: usize) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    let mut pointer = 0;
    let (mut pre_ins, mut pre_del) = (false, false);
    let (mut post_ins, mut post_del) = (false, false);

    while pointer < chunks.len() {
        if chunks[pointer].op == Op::Equal {
            let len = chunks[pointer].text.len();
            if len < edit_cost && (post_ins || post_del) {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(len);
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
            pointer += 1;
            continue;
        }

        if chunks[pointer].op == Op::Delete {
            post_del = true;
        } else {
            post_ins = true;
        }

        // Split when the equality is surrounded by edits on all four sides,
        // or is very short and surrounded on three.
        let sides = [pre_ins, pre_del, post_ins, post_del].iter().filter(|s| **s).count();
        let split = last_equality
            .is_some_and(|len| sides == 4 || (len * 2 < edit_cost && sides == 3));
        if let (true, Some(&eq_idx)) = (split, equalities.last()) {
            let text = chunks[eq_idx].text.clone();
            chunks.insert(eq_idx, Chunk::new(Op::Delete, text));
            chunks[eq_idx + 1].op = Op::Insert;
            equalities.pop();
            last_equality = None;
            changed = true;
            if pre_ins && pre_del {
                // No changes made which could affect previous entry, keep going.
                post_ins = true;
                post_del = true;
                equalities.clear();
                pointer += 1;
            } else {
                equalities.pop();
                pointer = equalities.last().map_or(0, |&p| p + 1);
                post_ins = false;
                post_del = false;
            }
            continue;
        }
        pointer += 1;
    }

    if changed {
        cleanup_merge(chunks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(t: &str) -> DiffOperation {
        DiffOperation::Equal(t.to_owned())
    }
    fn ins(t: &str) -> DiffOperation {
        DiffOperation::Insert(t.to_owned())
    }
    fn del(t: &str) -> DiffOperation {
        DiffOperation::Delete(t.to_owned())
    }

    #[test]
    fn identical_inputs_give_one_equality() {
        assert_eq!(diff("same text", "same text"), vec![eq("same text")]);
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn pure_insert_and_delete() {
        assert_eq!(diff("", "abc"), vec![ins("abc")]);
        assert_eq!(diff("abc", ""), vec![del("abc")]);
    }

    #[test]
    fn transposition_stays_one_replacement() {
        assert_eq!(
            diff("recieved apples", "received apples"),
            vec![eq("rec"), del("ie"), ins("ei"), eq("ved apples")]
        );
    }

    #[test]
    fn single_character_case_change() {
        assert_eq!(
            diff("E. Coli, a common bacteria", "E. coli, a common bacteria"),
            vec![eq("E. "), del("C"), ins("c"), eq("oli, a common bacteria")]
        );
    }

    #[test]
    fn trailing_annotation_is_one_insert() {
        assert_eq!(
            diff("3 + 5 = 9", "3 + 5 = 9 {Author: ...}"),
            vec![eq("3 + 5 = 9"), ins(" {Author: ...}")]
        );
    }

    #[test]
    fn repeated_text_keeps_leading_equality_maximal() {
        // "aaa" -> "aaaa": the insertion goes after the full equal run.
        assert_eq!(diff("aaa", "aaaa"), vec![eq("aaa"), ins("a")]);
        assert_eq!(diff("xaby", "xababy"), vec![eq("xab"), ins("ab"), eq("y")]);
    }

    #[test]
    fn word_boundary_inside_prefix_does_not_pull_edit_left() {
        assert_eq!(diff("x yy", "x y yy"), vec![eq("x y"), ins(" y"), eq("y")]);
        assert_eq!(diff("a b", "a  b"), vec![eq("a "), ins(" "), eq("b")]);
    }

    #[test]
    fn noisy_edits_are_merged_into_one_span() {
        let ops = diff("the quick brown fox", "the slow brown fox");
        let edits: Vec<_> = ops.iter().filter(|op| !op.is_equal()).collect();
        assert_eq!(edits.len(), 2, "{ops:?}");
        assert_eq!(original_side(&ops), "the quick brown fox");
        assert_eq!(edited_side(&ops), "the slow brown fox");
    }

    #[test]
    fn overlap_is_split_out() {
        assert_eq!(
            diff("abcxxx", "xxxdef"),
            vec![del("abc"), eq("xxx"), ins("def")]
        );
    }

    #[test]
    fn round_trip_holds_across_inputs() {
        let pairs = [
            ("", "x"),
            ("kitten", "sitting"),
            ("Dutch (Moroccan)", "Dutch (Moroccan)"),
            ("naïve café", "naive cafe"),
            ("one two three four", "one 2 three 4 five"),
            ("The cat sat.", "A dog sat down."),
            ("aaaa bbbb", "bbbb aaaa"),
            ("line one\nline two", "line one\n\nline 2"),
        ];
        for (a, b) in pairs {
            let ops = checked_diff(a, b, &DiffOptions::default()).unwrap();
            assert!(ops.iter().all(|op| !op.text().is_empty()), "{a:?} -> {b:?}: {ops:?}");
        }
    }

    #[test]
    fn verify_rejects_broken_scripts() {
        let err = verify(&[eq("ab")], "abc", "ab").unwrap_err();
        assert!(matches!(err, EngineError::Diff(_)));
    }

    #[test]
    fn positions_map_through_edits() {
        let ops = diff("recieved apples", "received apples");
        assert_eq!(map_position(&ops, 0), 0);
        assert_eq!(map_position(&ops, 9), 9);
        let ops = diff("3 + 5 = 9", "x 3 + 5 = 9");
        assert_eq!(map_position(&ops, 4), 6);
        let ops = diff("abc def", "def");
        assert_eq!(map_position(&ops, 1), 0);
        assert_eq!(map_position(&ops, 7), 3);
    }
}
