//! Progress events delivered to the UI shell while a session is being prepared.

use serde::{Deserialize, Serialize};

pub const MSG_CREATING_INDEX: &str = "Creating document index...";
pub const MSG_GENERATING_EMBEDDINGS: &str = "Generating embeddings...";
pub const MSG_GENERATING_SUGGESTIONS: &str = "Generating suggestions...";
pub const MSG_ALL_SET: &str = "All set!";

/// One progress snapshot: `current` of `total` steps done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub current: usize,
    pub total: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ProgressUpdate {
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Completion ratio in percent, rounded.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.current.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }
}

/// Notification that one file of a batch finished ingesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProgress {
    /// 1-based position of the file within the batch.
    pub index: usize,
    pub total: usize,
    pub file_name: String,
}
