//! Query request and result types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How strictly an answer must stay within retrieved content.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AccuracyMode {
    /// Only retrieved content; say so when the answer is absent.
    VeryAccurate,
    /// Prefer retrieved content, general knowledge may supplement it.
    #[default]
    Moderate,
    /// Retrieved content is a reference only.
    Creative,
}

/// Retrieval breadth, traded against answer brevity.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContextWindow {
    Short,
    #[default]
    Medium,
    High,
}

/// A single question against the active store. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default)]
    pub accuracy_mode: AccuracyMode,
    #[serde(default)]
    pub context_window: ContextWindow,
}

impl QueryRequest {
    /// Creates a request with the default (moderate, medium) settings.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            accuracy_mode: AccuracyMode::default(),
            context_window: ContextWindow::default(),
        }
    }

    pub fn with_accuracy_mode(mut self, mode: AccuracyMode) -> Self {
        self.accuracy_mode = mode;
        self
    }

    pub fn with_context_window(mut self, window: ContextWindow) -> Self {
        self.context_window = window;
        self
    }
}

/// A fragment of source content returned as evidence for an answer.
///
/// References a chunk inside the store; it does not own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_text: String,
    /// Document title or URI the chunk came from.
    pub source_ref: String,
}

/// The answer to one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer_text: String,
    pub citations: Vec<Citation>,
}
