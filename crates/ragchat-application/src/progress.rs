//! UI-visible phase machine.
//!
//! `ProgressState` is what a UI shell renders: the welcome screen, the upload
//! progress screen, the chat, or an error page. It only moves in response to
//! [`SessionEvent`]s.

use ragchat_core::progress::MSG_CREATING_INDEX;
use ragchat_core::{ProgressUpdate, RagError};
use serde::Serialize;

/// Inline message shown on the welcome screen after a credential failure.
pub const CREDENTIAL_ERROR_MESSAGE: &str =
    "The configured API key is invalid. Please provide a different one and try again.";

/// Events emitted while driving a session, consumed by [`ProgressState::apply`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user asked to start chatting over `file_count` files.
    StartRequested { file_count: usize },
    /// A preparation step finished.
    Progress(ProgressUpdate),
    /// Store created, populated, and suggestions generated.
    SessionReady,
    /// Starting the session failed.
    StartFailed(RagError),
    /// Something failed while chatting.
    Failed { context: String, error: RagError },
    /// The session was ended by the user.
    SessionEnded,
    /// The user acknowledged the error page.
    ErrorDismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ProgressState {
    /// Idle, no store.
    Welcome { credential_error: Option<String> },
    /// Store creation, population and suggestion generation.
    Uploading { progress: ProgressUpdate },
    /// Store ready, history active.
    Chatting,
    /// Terminal until dismissed.
    Error { message: String },
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::Welcome {
            credential_error: None,
        }
    }
}

impl ProgressState {
    /// Steps shown while uploading: store creation, one per file, suggestions.
    pub fn total_steps(file_count: usize) -> usize {
        file_count + 2
    }

    pub fn is_welcome(&self) -> bool {
        matches!(self, Self::Welcome { .. })
    }

    pub fn is_chatting(&self) -> bool {
        matches!(self, Self::Chatting)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn credential_error(&self) -> Option<&str> {
        match self {
            Self::Welcome { credential_error } => credential_error.as_deref(),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&ProgressUpdate> {
        match self {
            Self::Uploading { progress } => Some(progress),
            _ => None,
        }
    }

    /// Applies `event`. Events that make no sense in the current phase are ignored.
    pub fn apply(&mut self, event: SessionEvent) {
        let next = match (&*self, event) {
            (Self::Welcome { .. }, SessionEvent::StartRequested { file_count }) => {
                Some(Self::Uploading {
                    progress: ProgressUpdate::new(
                        0,
                        Self::total_steps(file_count),
                        MSG_CREATING_INDEX,
                    ),
                })
            }
            (Self::Uploading { .. }, SessionEvent::Progress(progress)) => {
                Some(Self::Uploading { progress })
            }
            (Self::Uploading { .. }, SessionEvent::SessionReady) => Some(Self::Chatting),
            (Self::Uploading { .. }, SessionEvent::StartFailed(error)) => {
                if error.is_credential_failure() {
                    Some(Self::Welcome {
                        credential_error: Some(CREDENTIAL_ERROR_MESSAGE.to_string()),
                    })
                } else {
                    Some(Self::Error {
                        message: format!("Failed to start chat session: {error}"),
                    })
                }
            }
            (Self::Error { .. }, SessionEvent::Failed { .. }) => None,
            (_, SessionEvent::Failed { context, error }) => Some(Self::Error {
                message: format!("{context}: {error}"),
            }),
            (_, SessionEvent::SessionEnded) => Some(Self::default()),
            (Self::Error { .. }, SessionEvent::ErrorDismissed) => Some(Self::default()),
            (state, event) => {
                tracing::debug!(?state, ?event, "Ignoring event in current phase");
                None
            }
        };

        if let Some(next) = next {
            *self = next;
        }
    }
}
