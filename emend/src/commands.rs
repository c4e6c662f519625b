use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use emend_core::{db, reconcile_store, EngineConfig, ReconcileReport, ReviewProgress, ReviewSession};

use crate::document::{self, OutputParagraph};

pub struct ApplyOptions {
    pub reject_all: bool,
    /// Journal database; `None` disables journaling.
    pub journal: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub struct ApplySummary {
    pub progress: ReviewProgress,
    pub failures: usize,
}

fn log_report(report: &ReconcileReport) {
    for number in &report.unmapped {
        warn!(paragraph_number = number, "paragraph could not be matched");
    }
    for (number, e) in &report.failures {
        error!(paragraph_number = number, error = %e, "corrections could not be computed");
    }
}

/// `emend corrections`: prints every correction as pretty JSON on stdout.
pub async fn corrections(path: &Path, config: &EngineConfig) -> Result<()> {
    let records = document::load(path)?;
    let mut store = document::seed_store(&records);
    let report = reconcile_store(&records, &mut store, config).await?;
    log_report(&report);
    println!("{}", serde_json::to_string_pretty(&report.corrections)?);
    Ok(())
}

/// `emend apply`: runs every correction through a review session.
///
/// Decisions are journaled once the session has finished deciding, then the
/// resulting paragraphs are written out.
pub async fn apply(path: &Path, config: &EngineConfig, options: &ApplyOptions) -> Result<ApplySummary> {
    let records = document::load(path)?;
    let mut store = document::seed_store(&records);
    let report = reconcile_store(&records, &mut store, config).await?;
    log_report(&report);

    let conn = match &options.journal {
        Some(journal) => {
            if let Some(parent) = journal.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            Some(db::open_db(&journal.to_string_lossy()).await?)
        }
        None => None,
    };

    let mut session = ReviewSession::start(store, report.corrections, config.clone()).await;
    if let Some(conn) = &conn {
        db::create_session(conn, session.id(), &path.display().to_string(), session.started_at()).await?;
    }

    let failures = if options.reject_all {
        let rejected = session.reject_all();
        info!(rejected, "rejected all corrections");
        0
    } else {
        let bulk = session.accept_all().await;
        for (id, e) in &bulk.failures {
            error!(correction = %id, error = %e, "correction not applied");
        }
        bulk.failures.len()
    };

    if let Some(conn) = &conn {
        for correction in session.corrections() {
            db::record_decision(conn, session.id(), correction).await?;
        }
    }

    let session_id = session.id().to_owned();
    let (progress, store) = session.end().await;
    if let Some(conn) = &conn {
        db::finish_session(conn, &session_id).await?;
    }

    let paragraphs: Vec<OutputParagraph> = store.into_paragraphs().into_iter().map(Into::into).collect();
    let json = serde_json::to_string_pretty(&paragraphs)?;
    match &options.output {
        Some(output) => std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?,
        None => println!("{json}"),
    }

    info!(
        applied = progress.applied,
        rejected = progress.rejected,
        pending = progress.pending,
        failures,
        "done"
    );
    Ok(ApplySummary { progress, failures })
}
