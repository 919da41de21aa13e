use super::teardown::{ActiveStoreSlot, spawn_detached_delete};
use super::unload_guard::UnloadGuard;
use crate::query::{QueryExecutor, RetryPolicy};
use crate::suggestions::SuggestionGenerator;
use crate::upload::UploadPipeline;
use ragchat_core::{
    FileProgress, QueryRequest, QueryResult, RagError, RagService, Result, SessionConfig, Sleeper,
    SourceFile, Store, StoreStatus, TokioSleeper,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle of the session's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No store exists.
    NoStore,
    /// The store is being created remotely.
    Creating,
    /// The store exists and documents are (or are about to be) uploaded.
    Populating,
    /// Documents were ingested; the store can be queried.
    Ready,
}

/// Owns the single active store of one RAG session.
///
/// `SessionManager` is responsible for:
/// - Creating the remote store
/// - Uploading documents into it and refreshing example questions
/// - Routing queries to it
/// - Tearing it down, without ever surfacing teardown failures
pub struct SessionManager {
    id: Uuid,
    service: Arc<dyn RagService>,
    sleeper: Arc<dyn Sleeper>,
    config: SessionConfig,
    uploads: UploadPipeline,
    queries: QueryExecutor,
    suggestions: SuggestionGenerator,
    store: Option<Store>,
    active: ActiveStoreSlot,
    example_questions: Vec<String>,
    state: SessionState,
}

impl SessionManager {
    /// Creates a manager that waits on the tokio timer.
    pub fn new(service: Arc<dyn RagService>, config: SessionConfig) -> Self {
        Self::with_sleeper(service, Arc::new(TokioSleeper), config)
    }

    /// Creates a manager with an explicit delay source for polling and backoff.
    pub fn with_sleeper(
        service: Arc<dyn RagService>,
        sleeper: Arc<dyn Sleeper>,
        config: SessionConfig,
    ) -> Self {
        let uploads =
            UploadPipeline::new(service.clone(), sleeper.clone(), config.poll_interval());
        let queries = QueryExecutor::new(
            service.clone(),
            sleeper.clone(),
            RetryPolicy::from_config(&config),
        );
        let suggestions = SuggestionGenerator::new(service.clone(), config.suggestion_count);

        Self {
            id: Uuid::new_v4(),
            service,
            sleeper,
            config,
            uploads,
            queries,
            suggestions,
            store: None,
            active: ActiveStoreSlot::new(),
            example_questions: Vec::new(),
            state: SessionState::NoStore,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sleeper(&self) -> Arc<dyn Sleeper> {
        self.sleeper.clone()
    }

    pub fn active_store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    /// Example questions for the current store, empty when there is none.
    pub fn suggestions(&self) -> &[String] {
        &self.example_questions
    }

    /// Returns a guard that deletes the active store when the process goes away.
    pub fn unload_guard(&self) -> UnloadGuard {
        UnloadGuard::new(self.service.clone(), self.active.clone())
    }

    /// Creates a remote store and makes it the active one.
    ///
    /// A previously active store is torn down first. On failure the session is
    /// left without a store.
    pub async fn start_session(&mut self, display_name: &str) -> Result<&Store> {
        if self.store.is_some() {
            tracing::info!(session = %self.id, "Replacing active store with a new one");
            self.end_session();
        }

        self.state = SessionState::Creating;
        tracing::info!(session = %self.id, display_name, "Creating RAG store");

        let store_id = match self.service.create_store(display_name).await {
            Ok(store_id) => store_id,
            Err(err) => {
                self.state = SessionState::NoStore;
                tracing::error!(session = %self.id, error = %err, "Failed to create RAG store");
                return Err(err);
            }
        };

        self.active.set(store_id.clone());
        self.state = SessionState::Populating;
        Ok(&*self.store.insert(Store::new(store_id, display_name)))
    }

    /// Uploads `files` into the active store, then regenerates example questions.
    ///
    /// An empty selection does nothing. Suggestions are only regenerated when
    /// the whole batch succeeded.
    pub async fn add_documents<F>(&mut self, files: &[SourceFile], on_progress: F) -> Result<()>
    where
        F: FnMut(FileProgress) + Send,
    {
        let store = self.store.as_mut().ok_or(RagError::NoActiveStore)?;
        if files.is_empty() {
            return Ok(());
        }

        self.state = SessionState::Populating;
        let outcome = self.uploads.upload_all(store, files, on_progress).await;

        self.state = if store.status == StoreStatus::Ready {
            SessionState::Ready
        } else {
            SessionState::Populating
        };
        outcome?;

        self.refresh_suggestions().await;
        Ok(())
    }

    /// Regenerates example questions for the active store.
    pub async fn refresh_suggestions(&mut self) -> &[String] {
        if let Some(store) = &self.store {
            self.example_questions = self.suggestions.generate(&store.id).await;
        }
        &self.example_questions
    }

    /// Answers `request` from the active store.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
        let store = self.store.as_ref().ok_or(RagError::NoActiveStore)?;
        self.queries.execute(&store.id, request).await
    }

    /// Forgets the active store and deletes it in the background.
    ///
    /// Returns the released store (status `Deleting`), or `None` when there was
    /// nothing to end. Never fails.
    pub fn end_session(&mut self) -> Option<Store> {
        let mut store = self.release()?;
        store.status = StoreStatus::Deleting;
        spawn_detached_delete(self.service.clone(), store.id.clone());
        Some(store)
    }

    /// Like [`end_session`](Self::end_session), but waits for the delete.
    ///
    /// The returned store is `Deleted` when the delete succeeded and stays
    /// `Deleting` otherwise; the failure itself is only logged.
    pub async fn end_session_and_wait(&mut self) -> Option<Store> {
        let mut store = self.release()?;
        store.status = StoreStatus::Deleting;
        match self.service.delete_store(&store.id, true).await {
            Ok(()) => {
                store.status = StoreStatus::Deleted;
                tracing::info!(session = %self.id, store = %store.id, "Deleted RAG store");
            }
            Err(err) => {
                tracing::error!(
                    session = %self.id,
                    store = %store.id,
                    error = %err,
                    "Failed to delete RAG store"
                );
            }
        }
        Some(store)
    }

    fn release(&mut self) -> Option<Store> {
        self.active.clear();
        self.example_questions.clear();
        self.state = SessionState::NoStore;
        let store = self.store.take()?;
        tracing::info!(session = %self.id, store = %store.id, "Ending session");
        Some(store)
    }
}
