//! Remote service bindings for ragchat.

pub mod config;
pub mod gemini_file_search;

pub use config::{GeminiConfig, SecretConfig};
pub use gemini_file_search::GeminiFileSearchClient;
