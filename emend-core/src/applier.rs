//! Applies one correction to the live document and proves it landed.
//!
//! Every apply follows the same steps:
//!
//! 1. Snapshot the live paragraph.
//! 2. If its collapsed text no longer equals the correction's
//!    `original_text`, the paragraph drifted: replace it whole with
//!    `corrected_text`.
//! 3. Otherwise locate the span, in order: unique context-window match,
//!    unique literal match (an anchor on either side for additions),
//!    whole-paragraph replacement. Then mutate only that span.
//! 4. Flush, re-read, and compare collapsed text against `corrected_text`.
//!    On mismatch restore the snapshot exactly and report the failure.
//!
//! There is no retry. A failed apply leaves the paragraph as it was found.

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{ApplyError, StoreError};
use crate::store::{DocumentStore, TextRange};
use crate::text::{char_len, char_slice, same_collapsed};
use crate::types::{ChangeType, Correction};

/// Which route a successful apply took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPath {
    /// Span found by searching for it with surrounding context.
    ContextWindow,
    /// Span (or an addition's anchor) found by a unique literal search.
    Literal,
    /// Span could not be located unambiguously; whole paragraph replaced.
    ParagraphReplacement,
    /// Live text drifted from the correction's baseline; whole paragraph replaced.
    ParagraphFallback,
}

impl ApplyPath {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyPath::ContextWindow => "context_window",
            ApplyPath::Literal => "literal",
            ApplyPath::ParagraphReplacement => "paragraph_replacement",
            ApplyPath::ParagraphFallback => "paragraph_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub path: ApplyPath,
    /// Live paragraph text after the verified apply.
    pub text: String,
}

/// Applies `correction` to `store` and verifies the result.
///
/// # Errors
///
/// - `ApplyError::VerificationFailed` when the re-read text does not match;
///   the snapshot has been restored.
/// - `ApplyError::RollbackFailed` when the restore could not be confirmed.
/// - `ApplyError::Store` when the store failed; a restore was attempted if
///   anything had been queued.
pub async fn apply<S: DocumentStore>(
    correction: &Correction,
    store: &mut S,
    config: &EngineConfig,
) -> Result<ApplyOutcome, ApplyError> {
    let paragraph_id = correction.paragraph_id.as_str();
    let snapshot = store.read(paragraph_id).await?;

    let path = if !same_collapsed(&snapshot, &correction.original_text) {
        warn!(
            correction = %correction.id,
            paragraph = paragraph_id,
            "paragraph drifted, replacing whole paragraph"
        );
        store.replace_paragraph(paragraph_id, &correction.corrected_text);
        ApplyPath::ParagraphFallback
    } else {
        match locate(correction, store, config).await? {
            Some((range, path)) => {
                mutate(correction, store, &range);
                path
            }
            None => {
                debug!(correction = %correction.id, "span not unique, replacing whole paragraph");
                store.replace_paragraph(paragraph_id, &correction.corrected_text);
                ApplyPath::ParagraphReplacement
            }
        }
    };

    if let Err(e) = store.sync().await {
        restore_quietly(store, paragraph_id, &snapshot).await;
        return Err(e.into());
    }
    let actual = match store.read(paragraph_id).await {
        Ok(text) => text,
        Err(e) => {
            restore_quietly(store, paragraph_id, &snapshot).await;
            return Err(e.into());
        }
    };

    if same_collapsed(&actual, &correction.corrected_text) {
        info!(correction = %correction.id, path = path.as_str(), "applied correction");
        return Ok(ApplyOutcome { path, text: actual });
    }

    warn!(
        correction = %correction.id,
        path = path.as_str(),
        "verification failed, rolling back"
    );
    Err(rollback(correction, store, snapshot, actual).await)
}

/// Finds the live range for the correction's span.
///
/// Returns `None` when no search yields exactly one hit.
async fn locate<S: DocumentStore>(
    correction: &Correction,
    store: &mut S,
    config: &EngineConfig,
) -> Result<Option<(TextRange, ApplyPath)>, StoreError> {
    let paragraph_id = correction.paragraph_id.as_str();
    let original = correction.original_text.as_str();
    let (start, end) = (correction.start_offset, correction.end_offset);

    let before = char_slice(original, start.saturating_sub(config.context_window), start);
    let after = char_slice(original, end, (end + config.context_window).min(char_len(original)));

    if !before.is_empty() || !after.is_empty() {
        let needle = format!("{before}{}{after}", correction.replaced_text);
        if let [hit] = store.search(paragraph_id, &needle).await?.as_slice() {
            let range = hit.narrow(char_len(before), correction.span_len());
            return Ok(Some((range, ApplyPath::ContextWindow)));
        }
    }

    let literal = match correction.change_type {
        ChangeType::Addition => {
            let mut anchored = None;
            if !before.is_empty() {
                if let [hit] = store.search(paragraph_id, before).await?.as_slice() {
                    anchored = Some(TextRange::point(paragraph_id, hit.end));
                }
            }
            if anchored.is_none() && !after.is_empty() {
                if let [hit] = store.search(paragraph_id, after).await?.as_slice() {
                    anchored = Some(TextRange::point(paragraph_id, hit.start));
                }
            }
            anchored
        }
        ChangeType::Deletion | ChangeType::Modification => {
            match store.search(paragraph_id, &correction.replaced_text).await?.as_slice() {
                [hit] => Some(hit.clone()),
                _ => None,
            }
        }
    };
    Ok(literal.map(|range| (range, ApplyPath::Literal)))
}

fn mutate<S: DocumentStore>(correction: &Correction, store: &mut S, range: &TextRange) {
    match correction.change_type {
        ChangeType::Addition => store.insert_at(range, &correction.diff_text),
        ChangeType::Deletion => store.delete_range(range),
        ChangeType::Modification => store.replace_range(range, &correction.diff_text),
    }
}

async fn rollback<S: DocumentStore>(
    correction: &Correction,
    store: &mut S,
    snapshot: String,
    actual: String,
) -> ApplyError {
    store.replace_paragraph(&correction.paragraph_id, &snapshot);
    let restored = match store.sync().await {
        Ok(()) => store.read(&correction.paragraph_id).await.ok(),
        Err(_) => None,
    };
    match restored {
        Some(text) if text == snapshot => ApplyError::VerificationFailed {
            correction_id: correction.id.clone(),
            expected: correction.corrected_text.clone(),
            actual,
        },
        other => {
            warn!(correction = %correction.id, "rollback could not be verified");
            ApplyError::RollbackFailed {
                correction_id: correction.id.clone(),
                snapshot,
                actual: other.unwrap_or(actual),
            }
        }
    }
}

async fn restore_quietly<S: DocumentStore>(store: &mut S, paragraph_id: &str, snapshot: &str) {
    store.replace_paragraph(paragraph_id, snapshot);
    if let Err(e) = store.sync().await {
        warn!(paragraph = paragraph_id, error = %e, "restore after store failure did not flush");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffOptions;
    use crate::store::MemoryStore;
    use crate::synthesize::{correct_paragraph, ParagraphRef};

    fn correction(original: &str, edited: &str) -> Correction {
        let target = ParagraphRef { paragraph_id: "p1", paragraph_number: 1 };
        let mut found = correct_paragraph(target, original, edited, &DiffOptions::default()).unwrap();
        assert_eq!(found.len(), 1, "{found:?}");
        found.remove(0)
    }

    #[tokio::test]
    async fn context_window_picks_the_right_repeat() {
        let c = correction("the cat sat. the cat ran.", "the cat sat. the dog ran.");
        let mut store = MemoryStore::from_texts([c.original_text.as_str()]);
        let outcome = apply(&c, &mut store, &EngineConfig::default()).await.unwrap();
        assert_eq!(outcome.path, ApplyPath::ContextWindow);
        assert_eq!(store.text("p1"), Some("the cat sat. the dog ran."));
    }

    #[tokio::test]
    async fn ambiguous_literal_falls_back_to_paragraph() {
        let c = correction("the cat sat. the cat ran.", "the cat sat. the dog ran.");
        let mut store = MemoryStore::from_texts([c.original_text.as_str()]);
        let config = EngineConfig { context_window: 0, ..EngineConfig::default() };
        let outcome = apply(&c, &mut store, &config).await.unwrap();
        assert_eq!(outcome.path, ApplyPath::ParagraphReplacement);
        assert_eq!(outcome.text, "the cat sat. the dog ran.");
    }

    #[tokio::test]
    async fn unique_literal_without_context() {
        let c = correction("teh cat", "the cat");
        let mut store = MemoryStore::from_texts(["teh cat"]);
        let config = EngineConfig { context_window: 0, ..EngineConfig::default() };
        let outcome = apply(&c, &mut store, &config).await.unwrap();
        assert_eq!(outcome.path, ApplyPath::Literal);
        assert_eq!(store.text("p1"), Some("the cat"));
    }

    #[tokio::test]
    async fn addition_at_end_of_paragraph() {
        let c = correction("3 + 5 = 9", "3 + 5 = 9 {Author: ...}");
        let mut store = MemoryStore::from_texts(["3 + 5 = 9"]);
        let outcome = apply(&c, &mut store, &EngineConfig::default()).await.unwrap();
        assert_eq!(outcome.path, ApplyPath::ContextWindow);
        assert_eq!(store.text("p1"), Some("3 + 5 = 9 {Author: ...}"));
    }

    #[tokio::test]
    async fn whitespace_only_drift_keeps_primary_path() {
        let c = correction("teh cat", "the cat");
        let mut store = MemoryStore::from_texts(["teh  cat"]);
        let outcome = apply(&c, &mut store, &EngineConfig::default()).await.unwrap();
        assert_ne!(outcome.path, ApplyPath::ParagraphFallback);
        assert!(same_collapsed(&outcome.text, "the cat"));
    }

    #[tokio::test]
    async fn drifted_paragraph_is_replaced_whole() {
        let c = correction("teh cat", "the cat");
        let mut store = MemoryStore::from_texts(["a dog now"]);
        let outcome = apply(&c, &mut store, &EngineConfig::default()).await.unwrap();
        assert_eq!(outcome.path, ApplyPath::ParagraphFallback);
        assert_eq!(store.text("p1"), Some("the cat"));
    }

    #[tokio::test]
    async fn failed_verification_restores_exact_snapshot() {
        let c = correction("recieved apples", "received apples");
        let mut store = MemoryStore::from_texts(["recieved apples"]);
        store.corrupt_next_sync(" ??");
        let err = apply(&c, &mut store, &EngineConfig::default()).await.unwrap_err();
        assert!(matches!(err, ApplyError::VerificationFailed { ref actual, .. } if actual == "received apples ??"));
        assert_eq!(store.text("p1"), Some("recieved apples"));
    }

    #[tokio::test]
    async fn unverifiable_rollback_is_reported() {
        let c = correction("recieved apples", "received apples");
        let mut store = MemoryStore::from_texts(["recieved apples"]);
        store.corrupt_syncs("!", 2);
        let err = apply(&c, &mut store, &EngineConfig::default()).await.unwrap_err();
        match err {
            ApplyError::RollbackFailed { snapshot, actual, .. } => {
                assert_eq!(snapshot, "recieved apples");
                assert_eq!(actual, "recieved apples!");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn sync_failure_surfaces_as_store_error() {
        let c = correction("recieved apples", "received apples");
        let mut store = MemoryStore::from_texts(["recieved apples"]);
        store.fail_next_sync("timeout");
        let err = apply(&c, &mut store, &EngineConfig::default()).await.unwrap_err();
        assert_eq!(err, ApplyError::Store(StoreError::SyncFailed("timeout".into())));
        assert_eq!(store.text("p1"), Some("recieved apples"));
    }

    #[tokio::test]
    async fn missing_paragraph_is_a_store_error() {
        let c = correction("teh cat", "the cat");
        let mut store = MemoryStore::from_texts(Vec::<String>::new());
        let err = apply(&c, &mut store, &EngineConfig::default()).await.unwrap_err();
        assert_eq!(err, ApplyError::Store(StoreError::ParagraphNotFound("p1".into())));
    }
}
