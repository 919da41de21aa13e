//! Domain model, error taxonomy and boundary traits for ragchat.

pub mod config;
pub mod error;
pub mod history;
pub mod progress;
pub mod query;
pub mod service;
pub mod store;

// Re-export common types
pub use config::SessionConfig;
pub use error::{RagError, Result};
pub use history::{ChatHistory, ConversationTurn, TurnRole};
pub use progress::{FileProgress, ProgressUpdate};
pub use query::{AccuracyMode, Citation, ContextWindow, QueryRequest, QueryResult};
pub use service::{GeneratedAnswer, GroundingChunk, RagService, Sleeper, TokioSleeper};
pub use store::{
    Operation, OperationHandle, SourceFile, Store, StoreId, StoreStatus, UploadState, UploadTask,
};
