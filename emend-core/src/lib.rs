//! emend-core: turns an independently edited copy of a paragraph-structured
//! document into a reviewable list of minimal, located corrections, and
//! applies the accepted ones to a live document with verification and
//! rollback.
//!
//! Pipeline:
//!
//! 1. [`reconcile`] matches each edited [`Paragraph`] to a live paragraph
//!    ([`matcher`]), strips markup ([`normalize`]), diffs per code point
//!    ([`diff`]), and emits [`Correction`]s ([`synthesize`]).
//! 2. A [`ReviewSession`] walks the corrections. Each apply goes through
//!    [`applier::apply`] against a [`DocumentStore`].
//! 3. Decisions can be journaled to SQLite ([`db`]).

pub mod applier;
pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod reconcile;
pub mod schema;
pub mod session;
pub mod store;
pub mod synthesize;
pub mod text;
pub mod types;

pub use applier::{apply, ApplyOutcome, ApplyPath};
pub use config::EngineConfig;
pub use diff::{diff, DiffOperation, DiffOptions};
pub use error::{ApplyError, ConfigError, EngineError, ReviewError, StoreError};
pub use matcher::{match_paragraph, MatchKind, ParagraphMatcher};
pub use normalize::normalize;
pub use reconcile::{reconcile, reconcile_store, ReconcileReport};
pub use session::{BulkOutcome, ReviewSession};
pub use store::{Annotation, DocumentStore, MemoryStore, TextRange};
pub use synthesize::{correct_paragraph, synthesize, ParagraphRef};
pub use types::{
    ChangeType, Correction, CorrectionStatus, DecisionRecord, LiveParagraph, Paragraph, ReviewProgress,
    ReviewRecord,
};
