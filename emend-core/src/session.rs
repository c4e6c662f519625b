//! Review session: a cursor over a snapshot of corrections.
//!
//! The session owns the document store for its whole lifetime. Every
//! operation takes `&mut self`, so an apply always runs to completion
//! (verified, rolled back, or failed) before the next call or `end()`.
//!
//! Status transitions:
//!
//! ```text
//! pending --> applied | rejected | skipped
//! skipped --> applied | rejected | skipped
//! applied, rejected: terminal
//! ```

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::applier::{self, ApplyOutcome};
use crate::config::EngineConfig;
use crate::diff::DiffOptions;
use crate::error::{ApplyError, ReviewError};
use crate::store::{DocumentStore, TextRange};
use crate::synthesize;
use crate::types::{now_secs, Correction, CorrectionStatus, ReviewProgress};

/// Result of [`ReviewSession::accept_all`].
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Ids of corrections applied, in order.
    pub applied: Vec<String>,
    /// Corrections that could not be applied. Their status is unchanged.
    pub failures: Vec<(String, ApplyError)>,
}

pub struct ReviewSession<S> {
    id: String,
    started_at: i64,
    corrections: Vec<Correction>,
    cursor: usize,
    store: S,
    config: EngineConfig,
}

fn annotation_range(correction: &Correction) -> TextRange {
    TextRange::new(
        correction.paragraph_id.as_str(),
        correction.start_offset,
        correction.end_offset,
    )
}

fn check_transition(correction: &Correction, next: CorrectionStatus) -> Result<(), ReviewError> {
    if correction.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(ReviewError::InvalidTransition {
            id: correction.id.clone(),
            from: correction.status.as_str(),
            to: next.as_str(),
        })
    }
}

impl<S: DocumentStore> ReviewSession<S> {
    /// Starts a review over `corrections`, taking ownership of `store`.
    ///
    /// Every correction is annotated with its id as tag. A correction that
    /// cannot be annotated is logged and the session starts anyway.
    pub async fn start(mut store: S, corrections: Vec<Correction>, config: EngineConfig) -> Self {
        let id = Uuid::new_v4().to_string();
        for correction in &corrections {
            store.annotate(&annotation_range(correction), &correction.id);
            if let Err(e) = store.sync().await {
                warn!(session = %id, correction = %correction.id, error = %e, "could not annotate correction");
            }
        }
        info!(session = %id, corrections = corrections.len(), "review started");
        Self {
            id,
            started_at: now_secs(),
            corrections,
            cursor: 0,
            store,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access. Writes made here bypass annotation bookkeeping.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The correction under the cursor, or `None` once past the end.
    pub fn current(&self) -> Option<&Correction> {
        self.corrections.get(self.cursor)
    }

    /// Applies the current correction and advances on success.
    ///
    /// Pending or skipped corrections in the same paragraph are moved onto
    /// the new text so they stay appliable by span.
    ///
    /// # Errors
    ///
    /// `ReviewError::NoCurrent` past the end, `InvalidTransition` for a
    /// terminal correction, `Apply` when the applier failed. On error neither
    /// status nor cursor changes.
    pub async fn apply_current(&mut self) -> Result<ApplyOutcome, ReviewError> {
        let idx = self.cursor;
        let current = self.corrections.get(idx).ok_or(ReviewError::NoCurrent)?;
        check_transition(current, CorrectionStatus::Applied)?;

        let outcome = applier::apply(current, &mut self.store, &self.config).await?;

        self.corrections[idx].status = CorrectionStatus::Applied;
        let applied = self.corrections[idx].clone();
        self.store.remove_annotations(&applied.id);
        self.rebase_siblings(&applied, &outcome.text);
        if let Err(e) = self.store.sync().await {
            warn!(session = %self.id, error = %e, "could not refresh annotations");
        }
        self.advance();
        Ok(outcome)
    }

    fn rebase_siblings(&mut self, applied: &Correction, new_text: &str) {
        let options = DiffOptions { edit_cost: self.config.edit_cost };
        for sibling in self.corrections.iter_mut().filter(|c| {
            c.paragraph_id == applied.paragraph_id && c.id != applied.id && !c.status.is_terminal()
        }) {
            if synthesize::rebase(sibling, applied, new_text, &options) {
                self.store.remove_annotations(&sibling.id);
                self.store.annotate(&annotation_range(sibling), &sibling.id);
            } else {
                debug!(correction = %sibling.id, "sibling span lost, left on stale baseline");
            }
        }
    }

    /// Rejects the current correction and advances.
    pub fn reject_current(&mut self) -> Result<(), ReviewError> {
        self.decide(CorrectionStatus::Rejected)
    }

    /// Skips the current correction and advances. It can be revisited.
    pub fn skip_current(&mut self) -> Result<(), ReviewError> {
        self.decide(CorrectionStatus::Skipped)
    }

    fn decide(&mut self, next: CorrectionStatus) -> Result<(), ReviewError> {
        let current = self.corrections.get_mut(self.cursor).ok_or(ReviewError::NoCurrent)?;
        check_transition(current, next)?;
        current.status = next;
        if next == CorrectionStatus::Rejected {
            self.store.remove_annotations(&current.id);
        }
        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.corrections.len());
    }

    fn last_index(&self) -> usize {
        self.corrections.len().saturating_sub(1)
    }

    pub fn navigate_next(&mut self) {
        self.cursor = (self.cursor + 1).min(self.last_index());
    }

    pub fn navigate_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1).min(self.last_index());
    }

    pub fn navigate_to(&mut self, index: usize) {
        self.cursor = index.min(self.last_index());
    }

    /// Applies every pending or skipped correction in order.
    ///
    /// Failures are collected and leave their correction untouched. The
    /// cursor ends on the first correction still open, or past the end.
    pub async fn accept_all(&mut self) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for idx in 0..self.corrections.len() {
            if self.corrections[idx].status.is_terminal() {
                continue;
            }
            self.cursor = idx;
            let id = self.corrections[idx].id.clone();
            match self.apply_current().await {
                Ok(_) => outcome.applied.push(id),
                Err(ReviewError::Apply(e)) => {
                    warn!(session = %self.id, correction = %id, error = %e, "bulk apply failed");
                    outcome.failures.push((id, e));
                }
                Err(e) => debug!(correction = %id, error = %e, "skipped during bulk apply"),
            }
        }
        self.cursor = self
            .corrections
            .iter()
            .position(|c| !c.status.is_terminal())
            .unwrap_or(self.corrections.len());
        outcome
    }

    /// Rejects every pending or skipped correction. Returns how many changed.
    pub fn reject_all(&mut self) -> usize {
        let mut rejected = 0;
        for correction in self.corrections.iter_mut().filter(|c| !c.status.is_terminal()) {
            correction.status = CorrectionStatus::Rejected;
            self.store.remove_annotations(&correction.id);
            rejected += 1;
        }
        self.cursor = self.corrections.len();
        rejected
    }

    /// Counts recomputed from current statuses.
    pub fn progress(&self) -> ReviewProgress {
        let total = self.corrections.len();
        let mut progress = ReviewProgress {
            current_position: if total == 0 { 0 } else { (self.cursor + 1).min(total) },
            total,
            ..ReviewProgress::default()
        };
        for correction in &self.corrections {
            match correction.status {
                CorrectionStatus::Pending => progress.pending += 1,
                CorrectionStatus::Applied => progress.applied += 1,
                CorrectionStatus::Rejected => progress.rejected += 1,
                CorrectionStatus::Skipped => progress.skipped += 1,
            }
        }
        progress
    }

    /// Ends the review, clearing every remaining annotation.
    ///
    /// Applied changes stay in the document. Returns the final counts and
    /// hands the store back.
    pub async fn end(mut self) -> (ReviewProgress, S) {
        for correction in &self.corrections {
            self.store.remove_annotations(&correction.id);
        }
        if let Err(e) = self.store.sync().await {
            warn!(session = %self.id, error = %e, "could not clear annotations");
        }
        let progress = self.progress();
        info!(
            session = %self.id,
            applied = progress.applied,
            rejected = progress.rejected,
            skipped = progress.skipped,
            pending = progress.pending,
            "review ended"
        );
        (progress, self.store)
    }
}
