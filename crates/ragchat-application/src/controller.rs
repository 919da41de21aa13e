//! The UI-event driver.
//!
//! `ChatController` is the one object a UI shell talks to. It turns user
//! actions into [`SessionManager`] calls, keeps the conversation history, and
//! mirrors everything into a [`ProgressState`].

use crate::progress::{ProgressState, SessionEvent};
use crate::session::{SessionManager, UnloadGuard};
use chrono::Utc;
use ragchat_core::progress::{
    MSG_ALL_SET, MSG_CREATING_INDEX, MSG_GENERATING_EMBEDDINGS, MSG_GENERATING_SUGGESTIONS,
};
use ragchat_core::{ChatHistory, FileProgress, ProgressUpdate, QueryRequest, Result, SourceFile};
use tokio::sync::mpsc::UnboundedSender;

/// Model turn appended when a query fails.
pub const QUERY_ERROR_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

const CONTEXT_START: &str = "Failed to start chat session";
const CONTEXT_QUERY: &str = "Failed to get response";
const CONTEXT_ADD_FILES: &str = "Failed to add files";

pub struct ChatController {
    manager: SessionManager,
    phase: ProgressState,
    history: ChatHistory,
    progress_tx: Option<UnboundedSender<ProgressUpdate>>,
}

impl ChatController {
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager,
            phase: ProgressState::default(),
            history: ChatHistory::new(),
            progress_tx: None,
        }
    }

    /// Forwards every progress update to `tx` as well.
    pub fn with_progress_channel(mut self, tx: UnboundedSender<ProgressUpdate>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn phase(&self) -> &ProgressState {
        &self.phase
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn suggestions(&self) -> &[String] {
        self.manager.suggestions()
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn unload_guard(&self) -> UnloadGuard {
        self.manager.unload_guard()
    }

    /// Short label for the loaded documents, empty without a session.
    pub fn document_label(&self) -> String {
        self.manager
            .active_store()
            .map(|store| store.document_label())
            .unwrap_or_default()
    }

    /// Creates a store over `files` and enters the chat.
    ///
    /// An empty selection does nothing. A running session is ended first and a
    /// pending error page is dismissed. On failure any store created along the
    /// way is deleted in the background and the phase reflects the error.
    pub async fn start_chat(&mut self, files: Vec<SourceFile>) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        if self.manager.active_store().is_some() {
            self.end_chat();
        } else if self.phase.is_error() {
            self.dismiss_error();
        }

        let total = ProgressState::total_steps(files.len());
        self.phase.apply(SessionEvent::StartRequested {
            file_count: files.len(),
        });
        self.emit(ProgressUpdate::new(0, total, MSG_CREATING_INDEX));

        match self.prepare(&files, total).await {
            Ok(()) => {
                self.history.clear();
                self.phase.apply(SessionEvent::SessionReady);
                tracing::info!(
                    session = %self.manager.id(),
                    documents = %self.document_label(),
                    "Chat session ready"
                );
                Ok(())
            }
            Err(err) => {
                self.manager.end_session();
                tracing::error!(error = %err, "{CONTEXT_START}");
                self.phase.apply(SessionEvent::StartFailed(err.clone()));
                Err(err)
            }
        }
    }

    async fn prepare(&mut self, files: &[SourceFile], total: usize) -> Result<()> {
        let display_name = format!(
            "{}-{}",
            self.manager.config().store_name_prefix,
            Utc::now().timestamp_millis()
        );
        self.manager.start_session(&display_name).await?;

        self.emit(ProgressUpdate::new(1, total, MSG_GENERATING_EMBEDDINGS));
        self.emit(
            ProgressUpdate::new(1, total, MSG_GENERATING_EMBEDDINGS)
                .with_file_name(file_step_label(1, files)),
        );

        let phase = &mut self.phase;
        let tx = self.progress_tx.as_ref();
        self.manager
            .add_documents(files, |done: FileProgress| {
                let update = if done.index < done.total {
                    ProgressUpdate::new(done.index + 1, total, MSG_GENERATING_EMBEDDINGS)
                        .with_file_name(file_step_label(done.index + 1, files))
                } else {
                    ProgressUpdate::new(done.total + 1, total, MSG_GENERATING_SUGGESTIONS)
                };
                publish(phase, tx, update);
            })
            .await?;

        self.emit(ProgressUpdate::new(total, total, MSG_ALL_SET));
        let pause = self.manager.config().ready_pause();
        self.manager.sleeper().sleep(pause).await;
        Ok(())
    }

    /// Asks `request` against the active store and records both turns.
    ///
    /// Without a session this does nothing.
    pub async fn send_message(&mut self, request: QueryRequest) -> Result<()> {
        if self.manager.active_store().is_none() {
            return Ok(());
        }

        self.history.push_user(request.text.clone());
        match self.manager.query(&request).await {
            Ok(result) => {
                self.history.push_answer(result);
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "{CONTEXT_QUERY}");
                self.history.push_model_notice(QUERY_ERROR_NOTICE);
                self.phase.apply(SessionEvent::Failed {
                    context: CONTEXT_QUERY.to_string(),
                    error: err.clone(),
                });
                Err(err)
            }
        }
    }

    /// Uploads more files into the running session.
    ///
    /// Without a session, or with an empty selection, this does nothing.
    pub async fn add_files(&mut self, files: Vec<SourceFile>) -> Result<()> {
        if self.manager.active_store().is_none() || files.is_empty() {
            return Ok(());
        }

        match self.manager.add_documents(&files, |_| {}).await {
            Ok(()) => {
                tracing::info!(
                    documents = %self.document_label(),
                    "Added files to chat session"
                );
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "{CONTEXT_ADD_FILES}");
                self.phase.apply(SessionEvent::Failed {
                    context: CONTEXT_ADD_FILES.to_string(),
                    error: err.clone(),
                });
                Err(err)
            }
        }
    }

    /// Drops the session and returns to the welcome screen. The store is
    /// deleted in the background.
    pub fn end_chat(&mut self) {
        self.manager.end_session();
        self.history.clear();
        self.phase.apply(SessionEvent::SessionEnded);
    }

    pub fn dismiss_error(&mut self) {
        self.phase.apply(SessionEvent::ErrorDismissed);
    }

    fn emit(&mut self, update: ProgressUpdate) {
        publish(&mut self.phase, self.progress_tx.as_ref(), update);
    }
}

fn publish(
    phase: &mut ProgressState,
    tx: Option<&UnboundedSender<ProgressUpdate>>,
    update: ProgressUpdate,
) {
    tracing::debug!(
        current = update.current,
        total = update.total,
        percent = update.percentage(),
        message = %update.message,
        "Progress"
    );
    if let Some(tx) = tx {
        // A closed receiver only means nobody is watching anymore.
        let _ = tx.send(update.clone());
    }
    phase.apply(SessionEvent::Progress(update));
}

/// "(i/n) name" for the 1-based file position `position`.
fn file_step_label(position: usize, files: &[SourceFile]) -> String {
    let name = files
        .get(position - 1)
        .map(|file| file.name.as_str())
        .unwrap_or_default();
    format!("({position}/{}) {name}", files.len())
}
