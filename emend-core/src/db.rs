//! Review journal: which corrections were decided how, per session.

use std::time::Duration;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::types::{now_secs, Correction, DecisionRecord, ReviewRecord};

/// Opens (or creates) the journal at `path`, configures WAL mode, and applies
/// schema migrations via the `schema_version` table.
///
/// `busy_timeout` is set through the `Connection` method rather than a
/// PRAGMA string so it takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL
/// configuration fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

/// Records a new review session for `document`.
///
/// `session_id` is the id of the live [`crate::ReviewSession`], so journal
/// rows and log lines share one identifier.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` insert fails,
/// including when `session_id` already exists.
pub async fn create_session(
    conn: &Connection,
    session_id: &str,
    document: &str,
    started_at: i64,
) -> Result<ReviewRecord, tokio_rusqlite::Error> {
    let id = session_id.to_owned();
    let document = document.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO review_sessions (id, document, started_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![&id, &document, started_at],
        )?;
        tx.commit()?;
        Ok(ReviewRecord {
            id,
            document,
            started_at,
            ended_at: None,
        })
    })
    .await
}

/// Upserts the current status of `correction` within `session_id`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the upsert transaction fails or the
/// session does not exist.
pub async fn record_decision(
    conn: &Connection,
    session_id: &str,
    correction: &Correction,
) -> Result<DecisionRecord, tokio_rusqlite::Error> {
    let record = DecisionRecord {
        session_id: session_id.to_owned(),
        correction_id: correction.id.clone(),
        paragraph_id: correction.paragraph_id.clone(),
        change_type: correction.change_type.as_str().to_owned(),
        status: correction.status.as_str().to_owned(),
        decided_at: now_secs(),
    };

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO decisions
                 (session_id, correction_id, paragraph_id, change_type, status, decided_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(session_id, correction_id)
             DO UPDATE SET status = excluded.status,
                           decided_at = excluded.decided_at",
            rusqlite::params![
                &record.session_id,
                &record.correction_id,
                &record.paragraph_id,
                &record.change_type,
                &record.status,
                record.decided_at
            ],
        )?;
        tx.commit()?;
        Ok(record)
    })
    .await
}

/// Loads every decision recorded for `session_id`, ordered by correction id.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn load_decisions(
    conn: &Connection,
    session_id: &str,
) -> Result<Vec<DecisionRecord>, tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();

    conn.call(move |db| {
        let mut stmt = db.prepare(
            "SELECT session_id, correction_id, paragraph_id, change_type, status, decided_at
             FROM decisions
             WHERE session_id = ?1
             ORDER BY correction_id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![&session_id], |r| {
                Ok(DecisionRecord {
                    session_id: r.get(0)?,
                    correction_id: r.get(1)?,
                    paragraph_id: r.get(2)?,
                    change_type: r.get(3)?,
                    status: r.get(4)?,
                    decided_at: r.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// Stamps `ended_at` on `session_id` and returns the updated row.
///
/// Returns `None` when no such session exists.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn finish_session(
    conn: &Connection,
    session_id: &str,
) -> Result<Option<ReviewRecord>, tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();

    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE review_sessions SET ended_at = ?1 WHERE id = ?2",
            rusqlite::params![now, &session_id],
        )?;
        let record = tx
            .query_row(
                "SELECT id, document, started_at, ended_at FROM review_sessions WHERE id = ?1",
                rusqlite::params![&session_id],
                |r| {
                    Ok(ReviewRecord {
                        id: r.get(0)?,
                        document: r.get(1)?,
                        started_at: r.get(2)?,
                        ended_at: r.get(3)?,
                    })
                },
            )
            .optional()?;
        tx.commit()?;
        Ok(record)
    })
    .await
}
