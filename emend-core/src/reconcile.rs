//! Whole-document pass: match, normalize, diff, synthesize.
//!
//! Partial success: a paragraph that cannot be matched or whose diff breaks
//! an invariant is reported and the rest of the document still yields
//! corrections.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::diff::DiffOptions;
use crate::error::{EngineError, StoreError};
use crate::matcher::ParagraphMatcher;
use crate::store::DocumentStore;
use crate::synthesize::{correct_paragraph, ParagraphRef};
use crate::types::{Correction, LiveParagraph, Paragraph};

#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Corrections in document order.
    pub corrections: Vec<Correction>,
    /// `paragraph_number`s of records with no live counterpart.
    pub unmapped: Vec<u32>,
    /// Matched records whose edited text normalizes to the live text.
    pub unchanged: usize,
    /// Records whose corrections could not be synthesized.
    pub failures: Vec<(u32, EngineError)>,
}

/// Computes corrections for every record against the live paragraphs.
///
/// Records are visited in `paragraph_number` order. Each live paragraph is
/// matched to at most one record, and corrections are computed against the
/// live text so their offsets address what the store holds now.
pub fn reconcile(records: &[Paragraph], live: &[LiveParagraph], config: &EngineConfig) -> ReconcileReport {
    let options = DiffOptions { edit_cost: config.edit_cost };
    let mut ordered: Vec<&Paragraph> = records.iter().collect();
    ordered.sort_by_key(|p| p.paragraph_number);

    let mut matcher = ParagraphMatcher::new(live, config);
    let mut report = ReconcileReport::default();

    for record in ordered {
        let Some((paragraph, _)) = matcher.resolve(&record.original_text, record.paragraph_number) else {
            debug!(paragraph_number = record.paragraph_number, "no live paragraph matched");
            report.unmapped.push(record.paragraph_number);
            continue;
        };
        let target = ParagraphRef {
            paragraph_id: &paragraph.id,
            paragraph_number: record.paragraph_number,
        };
        match correct_paragraph(target, &paragraph.text, &record.edited_text, &options) {
            Ok(found) if found.is_empty() => report.unchanged += 1,
            Ok(found) => report.corrections.extend(found),
            Err(e) => report.failures.push((record.paragraph_number, e)),
        }
    }

    info!(
        corrections = report.corrections.len(),
        unmapped = report.unmapped.len(),
        unchanged = report.unchanged,
        failures = report.failures.len(),
        "reconciled document"
    );
    report
}

/// [`reconcile`] against the paragraphs currently in `store`.
pub async fn reconcile_store<S: DocumentStore>(
    records: &[Paragraph],
    store: &mut S,
    config: &EngineConfig,
) -> Result<ReconcileReport, StoreError> {
    let live = store.paragraphs().await?;
    Ok(reconcile(records, &live, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: u32, original: &str, edited: &str) -> Paragraph {
        Paragraph {
            paragraph_number: number,
            native_paragraph_id: format!("n{number}"),
            original_text: original.to_owned(),
            marked_text: String::new(),
            edited_text: edited.to_owned(),
        }
    }

    #[test]
    fn scenarios_reconcile_in_order() {
        let records = vec![
            record(2, "recieved apples", "received apples"),
            record(1, "Dutch (Moroccan)", "<{ch_head}> Dutch (Moroccan)"),
            record(3, "3 + 5 = 9", "3 + 5 = 9 {Author: ...}"),
        ];
        let live = vec![
            LiveParagraph::new("a", "Dutch (Moroccan)"),
            LiveParagraph::new("b", "recieved apples"),
            LiveParagraph::new("c", "3 + 5 = 9"),
        ];
        let report = reconcile(&records, &live, &EngineConfig::default());
        assert_eq!(report.unchanged, 1);
        assert!(report.unmapped.is_empty());
        let ids: Vec<&str> = report.corrections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b-0", "c-0"]);
        assert_eq!(report.corrections[1].paragraph_number, 3);
    }

    #[test]
    fn unmatched_records_are_reported_not_fatal() {
        let records = vec![
            record(1, "first", "first!"),
            record(5, "nowhere to be found", "nowhere"),
        ];
        let live = vec![LiveParagraph::new("a", "first")];
        let report = reconcile(&records, &live, &EngineConfig::default());
        assert_eq!(report.unmapped, vec![5]);
        assert_eq!(report.corrections.len(), 1);
    }

    #[test]
    fn offsets_address_live_text() {
        let records = vec![record(1, "teh cat sat on the big red mat", "the cat sat on the big red mat")];
        let live = vec![LiveParagraph::new("a", "  teh cat sat on the big red mat today")];
        let report = reconcile(&records, &live, &EngineConfig::default());
        let c = &report.corrections[0];
        assert_eq!(c.original_text, live[0].text);
        assert_eq!(&c.original_text[2..5], "teh");
        assert_eq!(c.start_offset, 3);
    }
}
