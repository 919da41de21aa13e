mod common;

use common::{Call, MockRagService, RecordingSleeper, files};
use ragchat_application::UploadPipeline;
use ragchat_core::{FileProgress, RagError, Store, StoreId, StoreStatus};
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(3000);

fn setup() -> (Arc<MockRagService>, Arc<RecordingSleeper>, UploadPipeline) {
    let service = Arc::new(MockRagService::new());
    let sleeper = Arc::new(RecordingSleeper::new());
    let pipeline = UploadPipeline::new(service.clone(), sleeper.clone(), POLL);
    (service, sleeper, pipeline)
}

fn store() -> Store {
    Store::new(StoreId::new("fileSearchStores/store-1"), "chat-session-1")
}

#[tokio::test]
async fn test_progress_fires_once_per_file_in_order() {
    let (service, _sleeper, pipeline) = setup();
    let mut store = store();
    let mut seen = Vec::new();

    pipeline
        .upload_all(&mut store, &files(&["a.pdf", "b.pdf", "c.pdf"]), |progress| {
            seen.push(progress)
        })
        .await
        .unwrap();

    let indices: Vec<usize> = seen.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert!(seen.iter().all(|p| p.total == 3));
    assert_eq!(
        seen.last(),
        Some(&FileProgress {
            index: 3,
            total: 3,
            file_name: "c.pdf".into()
        })
    );
    assert_eq!(service.uploads(), vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(store.document_names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(store.status, StoreStatus::Ready);
}

#[tokio::test]
async fn test_each_file_finishes_before_the_next_starts() {
    let (service, _sleeper, pipeline) = setup();
    service.set_polls_before_done(1);
    let mut store = store();

    pipeline
        .upload_all(&mut store, &files(&["a.pdf", "b.pdf"]), |_| {})
        .await
        .unwrap();

    let calls = service.calls();
    assert_eq!(
        calls,
        vec![
            Call::Upload {
                store: "fileSearchStores/store-1".into(),
                file: "a.pdf".into()
            },
            Call::Poll("operations/a.pdf".into()),
            Call::Poll("operations/a.pdf".into()),
            Call::Upload {
                store: "fileSearchStores/store-1".into(),
                file: "b.pdf".into()
            },
            Call::Poll("operations/b.pdf".into()),
            Call::Poll("operations/b.pdf".into()),
        ]
    );
}

#[tokio::test]
async fn test_polls_at_fixed_interval_until_done() {
    let (service, sleeper, pipeline) = setup();
    service.set_polls_before_done(2);
    let mut store = store();

    pipeline
        .upload_all(&mut store, &files(&["a.pdf"]), |_| {})
        .await
        .unwrap();

    assert_eq!(sleeper.delays(), vec![POLL, POLL, POLL]);
}

#[tokio::test]
async fn test_failure_aborts_batch_and_keeps_committed_files() {
    let (service, _sleeper, pipeline) = setup();
    service.fail_operation("b.pdf", "unsupported file");
    let mut store = store();
    let mut progress_calls = 0;

    let err = pipeline
        .upload_all(&mut store, &files(&["a.pdf", "b.pdf", "c.pdf"]), |_| {
            progress_calls += 1
        })
        .await
        .unwrap_err();

    assert_eq!(err, RagError::upload_failure("b.pdf", "unsupported file"));
    assert_eq!(progress_calls, 1);
    assert_eq!(service.uploads(), vec!["a.pdf", "b.pdf"]);
    assert_eq!(store.document_names, vec!["a.pdf"]);
    assert_eq!(store.status, StoreStatus::Ready);
}

#[tokio::test]
async fn test_first_file_failure_leaves_store_empty() {
    let (service, _sleeper, pipeline) = setup();
    service.fail_upload("a.pdf", RagError::not_found("fileSearchStores/store-1"));
    let mut store = store();

    let err = pipeline
        .upload_all(&mut store, &files(&["a.pdf", "b.pdf"]), |_| {})
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(store.document_names.is_empty());
    assert_eq!(store.status, StoreStatus::Empty);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let (service, sleeper, pipeline) = setup();
    let mut store = store();
    let mut progress_calls = 0;

    pipeline
        .upload_all(&mut store, &[], |_| progress_calls += 1)
        .await
        .unwrap();

    assert_eq!(progress_calls, 0);
    assert!(service.calls().is_empty());
    assert!(sleeper.delays().is_empty());
    assert_eq!(store.status, StoreStatus::Empty);
}
