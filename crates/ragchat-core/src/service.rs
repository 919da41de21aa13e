//! Boundary traits for the remote RAG service and the delay source.
//!
//! Application services depend on these traits only; the HTTP binding lives in
//! `ragchat-interaction` and tests supply in-memory doubles.

use crate::error::Result;
use crate::store::{Operation, OperationHandle, SourceFile, StoreId};
use async_trait::async_trait;
use std::time::Duration;

/// A retrieved fragment attached to a generated answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingChunk {
    pub text: Option<String>,
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Raw output of a grounded generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedAnswer {
    pub text: String,
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// Primitives offered by a remote RAG service.
///
/// Every method is one suspension point. Implementations classify failures
/// into [`crate::RagError`] variants; callers never inspect transport errors.
#[async_trait]
pub trait RagService: Send + Sync {
    /// Creates a store and returns its handle.
    async fn create_store(&self, display_name: &str) -> Result<StoreId>;

    /// Starts ingesting `file` into `store`, returning the long-running operation.
    async fn upload_file(&self, store: &StoreId, file: &SourceFile) -> Result<Operation>;

    /// Fetches the current state of a long-running operation.
    async fn poll_operation(&self, handle: &OperationHandle) -> Result<Operation>;

    /// Generates an answer to `prompt`, retrieving from `store`.
    async fn generate_answer(&self, store: &StoreId, prompt: &str) -> Result<GeneratedAnswer>;

    /// Deletes a store. `force` also removes contained documents.
    async fn delete_store(&self, store: &StoreId, force: bool) -> Result<()>;
}

/// Source of delays for poll ticks and retry backoff.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
