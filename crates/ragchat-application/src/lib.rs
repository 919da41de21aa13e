//! Session orchestration for ragchat.
//!
//! Everything here talks to the remote side only through
//! [`ragchat_core::RagService`], so any backend (or a test double) can be used.

pub mod controller;
pub mod progress;
pub mod query;
pub mod session;
pub mod suggestions;
pub mod upload;

pub use controller::{ChatController, QUERY_ERROR_NOTICE};
pub use progress::{CREDENTIAL_ERROR_MESSAGE, ProgressState, SessionEvent};
pub use query::{QueryExecutor, RetryPolicy, build_instruction, build_prompt};
pub use session::{
    ActiveStoreSlot, SessionManager, SessionState, UnloadGuard, spawn_detached_delete,
};
pub use suggestions::{FALLBACK_QUESTIONS, SuggestionGenerator, parse_suggestions};
pub use upload::UploadPipeline;
