//! Integration test for the review journal.
//!
//! Exercises: open_db, migrate, create_session, record_decision,
//! load_decisions, finish_session.

use emend_core::db;
use emend_core::{ChangeType, Correction, CorrectionStatus};

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("reviews.db");
    path.to_string_lossy().to_string()
}

fn correction(id: &str, status: CorrectionStatus) -> Correction {
    Correction {
        id: id.to_owned(),
        paragraph_id: "p1".to_owned(),
        paragraph_number: 1,
        original_text: "recieved apples".to_owned(),
        corrected_text: "received apples".to_owned(),
        change_type: ChangeType::Modification,
        diff_text: "ei".to_owned(),
        replaced_text: "ie".to_owned(),
        start_offset: 3,
        end_offset: 5,
        suggestion: "Change \"ie\" to \"ei\"".to_owned(),
        status,
    }
}

#[tokio::test]
async fn full_journal_lifecycle() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let decisions_pk_count: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT COUNT(*) FROM pragma_table_info('decisions') WHERE pk > 0",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(decisions_pk_count, 2, "decisions should have composite PK");

    let session = db::create_session(&conn, "3f1c0f8e-0000-4000-8000-000000000001", "doc.json", 100)
        .await
        .unwrap();
    assert_eq!(session.document, "doc.json");
    assert!(session.ended_at.is_none());

    let dup = db::create_session(&conn, &session.id, "doc.json", 101).await;
    assert!(dup.is_err(), "session ids are unique");

    assert!(db::load_decisions(&conn, &session.id).await.unwrap().is_empty());

    db::record_decision(&conn, &session.id, &correction("p1-0", CorrectionStatus::Skipped))
        .await
        .unwrap();
    db::record_decision(&conn, &session.id, &correction("p1-1", CorrectionStatus::Rejected))
        .await
        .unwrap();
    // Re-deciding overwrites rather than appends.
    db::record_decision(&conn, &session.id, &correction("p1-0", CorrectionStatus::Applied))
        .await
        .unwrap();

    let decisions = db::load_decisions(&conn, &session.id).await.unwrap();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].correction_id, "p1-0");
    assert_eq!(decisions[0].status, "applied");
    assert_eq!(decisions[0].change_type, "modification");
    assert_eq!(decisions[1].status, "rejected");

    let finished = db::finish_session(&conn, &session.id).await.unwrap().unwrap();
    assert!(finished.ended_at.is_some());
    assert!(db::finish_session(&conn, "missing").await.unwrap().is_none());

    // Persisted across connections.
    let conn2 = db::open_db(&path).await.unwrap();
    let decisions2 = db::load_decisions(&conn2, &session.id).await.unwrap();
    assert_eq!(decisions2.len(), 2, "decisions should persist across connections");
}

#[tokio::test]
async fn decision_for_unknown_session_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("fk.db").to_string_lossy().to_string();
    let conn = db::open_db(&path).await.unwrap();

    let result = db::record_decision(&conn, "no-such-session", &correction("p1-0", CorrectionStatus::Applied)).await;
    assert!(result.is_err(), "foreign key should reject orphan decisions");
}

#[tokio::test]
async fn reopening_does_not_rerun_migration() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("again.db").to_string_lossy().to_string();
    drop(db::open_db(&path).await.unwrap());
    let conn = db::open_db(&path).await.unwrap();

    let rows: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(rows, 1);
}
