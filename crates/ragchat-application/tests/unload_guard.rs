mod common;

use common::{MockRagService, RecordingSleeper};
use ragchat_application::{ActiveStoreSlot, SessionManager, UnloadGuard};
use ragchat_core::{SessionConfig, StoreId};
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_deletes(service: &MockRagService, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), service.wait_for_deletes(count))
        .await
        .expect("background delete was not scheduled");
}

#[tokio::test]
async fn test_dropping_guard_deletes_active_store() {
    let service = Arc::new(MockRagService::new());
    let mut manager = SessionManager::with_sleeper(
        service.clone(),
        Arc::new(RecordingSleeper::new()),
        SessionConfig::default(),
    );
    let guard = manager.unload_guard();
    manager.start_session("chat-session-1").await.unwrap();

    drop(guard);

    wait_for_deletes(&service, 1).await;
    assert_eq!(
        service.deletes(),
        vec![("fileSearchStores/store-1".to_string(), true)]
    );
}

#[tokio::test]
async fn test_guard_is_idle_after_session_ended() {
    let service = Arc::new(MockRagService::new());
    let mut manager = SessionManager::with_sleeper(
        service.clone(),
        Arc::new(RecordingSleeper::new()),
        SessionConfig::default(),
    );
    let guard = manager.unload_guard();
    manager.start_session("chat-session-1").await.unwrap();
    manager.end_session_and_wait().await;

    assert!(!guard.trigger());
    assert_eq!(service.deletes().len(), 1);
}

#[tokio::test]
async fn test_trigger_fires_once() {
    let service = Arc::new(MockRagService::new());
    let slot = ActiveStoreSlot::new();
    slot.set(StoreId::new("fileSearchStores/store-9"));
    let guard = UnloadGuard::new(service.clone(), slot.clone());

    assert!(guard.trigger());
    assert!(!guard.trigger());
    assert!(slot.get().is_none());

    wait_for_deletes(&service, 1).await;
    drop(guard);
    tokio::task::yield_now().await;
    assert_eq!(service.deletes().len(), 1);
}

#[test]
fn test_trigger_without_runtime_only_logs() {
    let service = Arc::new(MockRagService::new());
    let slot = ActiveStoreSlot::new();
    slot.set(StoreId::new("fileSearchStores/store-1"));
    let guard = UnloadGuard::new(service.clone(), slot);

    assert!(guard.trigger());
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_ctrl_c_watcher_keeps_session_alive() {
    let service = Arc::new(MockRagService::new());
    let mut manager = SessionManager::with_sleeper(
        service.clone(),
        Arc::new(RecordingSleeper::new()),
        SessionConfig::default(),
    );
    manager.start_session("chat-session-1").await.unwrap();

    let watcher = manager.unload_guard().watch_ctrl_c();
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    assert!(service.deletes().is_empty());
    assert!(manager.active_store().is_some());

    watcher.abort();
    assert!(watcher.await.unwrap_err().is_cancelled());
    wait_for_deletes(&service, 1).await;
    assert_eq!(
        service.deletes(),
        vec![("fileSearchStores/store-1".to_string(), true)]
    );
}
