use std::sync::Arc;

use ivideo_core::model::{
    AnswerLedger, IVideoId, QuestionSchedule, QuestionSpec, SUBMISSION_CONTENT_TYPE,
    SubmissionRecord, ViewerId, storage_key,
};
use ivideo_core::time::{fixed_clock, fixed_now};
use storage::{InMemoryUploadStore, Storage, StorageError, UploadProgress, UploadRequest};
use tokio::sync::mpsc;

fn schedule() -> QuestionSchedule {
    QuestionSchedule::new(vec![
        QuestionSpec::new(2.0, "q1", vec!["o1".into(), "o2".into()]),
        QuestionSpec::new(4.0, "q2", vec!["op1".into(), "op2".into()]),
    ])
    .unwrap()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<UploadProgress>) -> Vec<u8> {
    let mut percents = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        percents.push(progress.percent());
    }
    percents
}

#[tokio::test]
async fn submission_record_is_stored_and_overwritten_per_viewer() {
    let store = InMemoryUploadStore::new().with_clock(fixed_clock());
    let storage = Storage::from_gateway(Arc::new(store.clone()));
    storage.uploads.authenticate().await.unwrap();

    let schedule = schedule();
    let key = storage_key(
        "answers",
        &IVideoId::new("Mtr6k7Ugzv").unwrap(),
        &ViewerId::parse("student@example.org").unwrap(),
    );
    let mut ledger = AnswerLedger::new(schedule.len());
    let (tx, mut rx) = mpsc::unbounded_channel();

    ledger.set(0, "o2").unwrap();
    let first = SubmissionRecord::build(&ledger, &schedule);
    storage
        .uploads
        .upload(
            UploadRequest::new(
                key.clone(),
                first.to_json_bytes().unwrap(),
                SUBMISSION_CONTENT_TYPE,
            ),
            tx.clone(),
        )
        .await
        .unwrap();
    assert_eq!(drain(&mut rx).last(), Some(&100));

    ledger.set(1, "op1").unwrap();
    let second = SubmissionRecord::build(&ledger, &schedule);
    let receipt = storage
        .uploads
        .upload(
            UploadRequest::new(
                key.clone(),
                second.to_json_bytes().unwrap(),
                SUBMISSION_CONTENT_TYPE,
            ),
            tx,
        )
        .await
        .unwrap();
    assert_eq!(receipt.stored_at, fixed_now());

    assert_eq!(store.keys(), vec![key.clone()]);
    let stored = store.object(&key).unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.content_type, "application/json");
    let parsed = SubmissionRecord::from_json_bytes(&stored.body).unwrap();
    assert_eq!(parsed, second);
}

#[tokio::test]
async fn large_bodies_report_progress_in_steps() {
    let store = InMemoryUploadStore::new();
    let storage = Storage::from_gateway(Arc::new(store.clone()));
    storage.uploads.authenticate().await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let body = vec![b' '; 64 * 1024];
    storage
        .uploads
        .upload(UploadRequest::new("answers/big.json", body, "application/json"), tx)
        .await
        .unwrap();

    assert_eq!(drain(&mut rx), vec![25, 50, 75, 100]);
}

#[tokio::test]
async fn offline_store_rejects_authentication_and_uploads() {
    let store = InMemoryUploadStore::new();
    store.set_offline(true);
    let storage = Storage::from_gateway(Arc::new(store.clone()));

    assert!(matches!(
        storage.uploads.authenticate().await,
        Err(StorageError::Connection(_))
    ));
    let (tx, _rx) = mpsc::unbounded_channel();
    let err = storage
        .uploads
        .upload(UploadRequest::new("k.json", b"{}".to_vec(), "application/json"), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Connection(_)));
    assert_eq!(store.upload_count(), 0);
}
