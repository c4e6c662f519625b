//! End-to-end review over an in-memory document: reconcile, start a session,
//! decide, and end.

use emend_core::{
    reconcile_store, ApplyError, CorrectionStatus, DocumentStore, EngineConfig, MemoryStore, Paragraph,
    ReviewError, ReviewSession,
};

fn record(number: u32, original: &str, edited: &str) -> Paragraph {
    Paragraph {
        paragraph_number: number,
        native_paragraph_id: format!("n{number}"),
        original_text: original.to_owned(),
        marked_text: String::new(),
        edited_text: edited.to_owned(),
    }
}

fn document() -> (Vec<Paragraph>, MemoryStore) {
    let records = vec![
        record(1, "Dutch (Moroccan)", "<{ch_head}> Dutch (Moroccan)"),
        record(2, "He recieved apples and pears.", "He received apples and pears."),
        record(3, "E. Coli, a common bacteria", "E. coli, a common <[i]>bacteria<[/i]>"),
        record(4, "3 + 5 = 9", "3 + 5 = 9 {Author: ...}"),
    ];
    let store = MemoryStore::from_texts(records.iter().map(|r| r.original_text.clone()));
    (records, store)
}

#[tokio::test]
async fn accept_everything() {
    let (records, mut store) = document();
    let config = EngineConfig::default();
    let report = reconcile_store(&records, &mut store, &config).await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.corrections.len(), 3);

    let mut session = ReviewSession::start(store, report.corrections, config).await;
    let bulk = session.accept_all().await;
    assert_eq!(bulk.applied.len(), 3);
    assert!(bulk.failures.is_empty());

    let (progress, mut store) = session.end().await;
    assert_eq!(progress.applied, 3);
    assert!(progress.is_complete());
    assert_eq!(store.read("p2").await.unwrap(), "He received apples and pears.");
    assert_eq!(store.read("p3").await.unwrap(), "E. coli, a common bacteria");
    assert_eq!(store.read("p4").await.unwrap(), "3 + 5 = 9 {Author: ...}");
    assert_eq!(store.read("p1").await.unwrap(), "Dutch (Moroccan)");
}

#[tokio::test]
async fn mixed_decisions_keep_counts_consistent() {
    let (records, mut store) = document();
    let config = EngineConfig::default();
    let report = reconcile_store(&records, &mut store, &config).await.unwrap();
    let mut session = ReviewSession::start(store, report.corrections, config).await;

    let check = |s: &ReviewSession<MemoryStore>| {
        let p = s.progress();
        assert_eq!(p.applied + p.rejected + p.skipped + p.pending, p.total);
    };

    check(&session);
    session.apply_current().await.unwrap();
    check(&session);
    session.reject_current().unwrap();
    check(&session);
    session.skip_current().unwrap();
    check(&session);
    assert!(session.current().is_none());

    session.navigate_to(2);
    assert_eq!(session.current().map(|c| c.status), Some(CorrectionStatus::Skipped));
    session.reject_current().unwrap();
    check(&session);

    let (progress, store) = session.end().await;
    assert_eq!((progress.applied, progress.rejected, progress.pending), (1, 2, 0));
    assert_eq!(store.text("p3"), Some("E. Coli, a common bacteria"));
    assert!(store.annotations().is_empty());
}

#[tokio::test]
async fn forced_failure_rolls_back_and_session_continues() {
    let (records, mut store) = document();
    let config = EngineConfig::default();
    let report = reconcile_store(&records, &mut store, &config).await.unwrap();
    let mut session = ReviewSession::start(store, report.corrections, config).await;

    let before = session.store().text("p2").map(str::to_owned);
    session.store_mut().corrupt_next_sync(" (garbled)");
    let err = session.apply_current().await.unwrap_err();
    assert!(matches!(err, ReviewError::Apply(ApplyError::VerificationFailed { .. })));
    assert_eq!(session.store().text("p2").map(str::to_owned), before);
    assert_eq!(session.cursor(), 0);

    session.apply_current().await.unwrap();
    assert_eq!(session.cursor(), 1);
    let (progress, _) = session.end().await;
    assert_eq!((progress.applied, progress.pending), (1, 2));
}
