//! Error types for the correction engine.
//!
//! A reviewer retries or skips an `ApplyError`. A reconcile run reports
//! `EngineError`s per paragraph and keeps going.

use thiserror::Error;

/// Failures reported by a live document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Paragraph not found: {0}")]
    ParagraphNotFound(String),

    #[error("Range {start}..{end} out of bounds for paragraph {paragraph_id} (length {len})")]
    RangeOutOfBounds {
        paragraph_id: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

/// Invariant violations inside the diff and synthesis pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The diff did not reconstruct one of its inputs.
    #[error("Diff invariant violated: {0}")]
    Diff(String),

    #[error("Correction {id} has offsets {start}..{end} outside a text of length {len}")]
    OffsetsOutOfRange {
        id: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Why applying a single correction failed.
///
/// Every variant is returned only after the paragraph has been restored (or
/// restoration was attempted and reported as `RollbackFailed`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("Verification failed for {correction_id}: expected {expected:?}, found {actual:?}")]
    VerificationFailed {
        correction_id: String,
        expected: String,
        actual: String,
    },

    #[error("Rollback failed for {correction_id}: paragraph left as {actual:?}")]
    RollbackFailed {
        correction_id: String,
        snapshot: String,
        actual: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from review session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("No correction at the cursor")]
    NoCurrent,

    #[error("Correction {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
