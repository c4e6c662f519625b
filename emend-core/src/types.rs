use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One paragraph record from the edited source document.
///
/// Records arrive already decoded and are never mutated by the engine.
/// `paragraph_number` is 1-based and defines document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub paragraph_number: u32,
    pub native_paragraph_id: String,
    /// Markup-free baseline text.
    pub original_text: String,
    /// Baseline text with authoring markup. Carried through, never diffed.
    #[serde(default)]
    pub marked_text: String,
    /// Edited version; may still carry inline markup.
    pub edited_text: String,
}

/// A paragraph as currently held by the live document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveParagraph {
    pub id: String,
    pub text: String,
}

impl LiveParagraph {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// The kind of edit a correction performs on the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Text present in the corrected version only. Zero-width in the original.
    Addition,
    /// Text present in the original only.
    Deletion,
    /// An original span replaced by different text.
    Modification,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Addition => "addition",
            ChangeType::Deletion => "deletion",
            ChangeType::Modification => "modification",
        }
    }
}

/// Review status of a single correction.
///
/// `Applied` and `Rejected` are terminal. `Skipped` may be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionStatus {
    #[default]
    Pending,
    Applied,
    Rejected,
    Skipped,
}

impl CorrectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionStatus::Pending => "pending",
            CorrectionStatus::Applied => "applied",
            CorrectionStatus::Rejected => "rejected",
            CorrectionStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CorrectionStatus::Applied | CorrectionStatus::Rejected)
    }

    /// Whether a reviewer decision may move a correction from `self` to `next`.
    pub fn can_transition_to(self, next: CorrectionStatus) -> bool {
        !self.is_terminal() && next != CorrectionStatus::Pending
    }
}

/// One minimal, located, classified edit derived from a diff.
///
/// Offsets count Unicode code points from the start of `original_text`.
/// For additions `start_offset == end_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    /// `"{paragraph_id}-{index}"`, stable across re-runs on the same input.
    pub id: String,
    /// Live store identifier of the paragraph this correction targets.
    pub paragraph_id: String,
    pub paragraph_number: u32,
    /// Paragraph text this correction was computed against.
    pub original_text: String,
    /// `original_text` with only this correction applied.
    pub corrected_text: String,
    pub change_type: ChangeType,
    /// Inserted text for additions and modifications, removed text for deletions.
    pub diff_text: String,
    /// Original text covered by `[start_offset, end_offset)`. Empty for additions.
    pub replaced_text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Presentation only. Never parsed back into offsets or text.
    pub suggestion: String,
    pub status: CorrectionStatus,
}

impl Correction {
    /// Text that ends up in `[start_offset, end_offset)` once applied.
    pub fn replacement(&self) -> &str {
        match self.change_type {
            ChangeType::Deletion => "",
            ChangeType::Addition | ChangeType::Modification => &self.diff_text,
        }
    }

    pub fn span_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// Aggregate counts for a review session, recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewProgress {
    /// 1-based cursor position; `total` once past the end, 0 when empty.
    pub current_position: usize,
    pub total: usize,
    pub applied: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub pending: usize,
}

impl ReviewProgress {
    /// True once every correction is applied or rejected.
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.skipped == 0
    }
}

/// A review session row in the journal.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub id: String,           // UUID v4 text
    pub document: String,
    pub started_at: i64,      // Unix timestamp seconds
    pub ended_at: Option<i64>,
}

/// The last recorded decision for one correction within a journaled session.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub session_id: String,
    pub correction_id: String,
    pub paragraph_id: String,
    pub change_type: String,
    pub status: String,
    pub decided_at: i64,
}

/// Returns the current Unix timestamp in seconds.
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_reject_further_transitions() {
        assert!(CorrectionStatus::Pending.can_transition_to(CorrectionStatus::Applied));
        assert!(CorrectionStatus::Skipped.can_transition_to(CorrectionStatus::Rejected));
        assert!(CorrectionStatus::Skipped.can_transition_to(CorrectionStatus::Skipped));
        assert!(!CorrectionStatus::Applied.can_transition_to(CorrectionStatus::Rejected));
        assert!(!CorrectionStatus::Rejected.can_transition_to(CorrectionStatus::Skipped));
        assert!(!CorrectionStatus::Pending.can_transition_to(CorrectionStatus::Pending));
    }

    #[test]
    fn paragraph_decodes_camel_case_fields() {
        let json = r#"{
            "paragraphNumber": 2,
            "nativeParagraphId": "p-2",
            "originalText": "3 + 5 = 9",
            "editedText": "3 + 5 = 9 {Author: check}"
        }"#;
        let p: Paragraph = serde_json::from_str(json).unwrap();
        assert_eq!(p.paragraph_number, 2);
        assert_eq!(p.native_paragraph_id, "p-2");
        assert!(p.marked_text.is_empty());
    }
}
