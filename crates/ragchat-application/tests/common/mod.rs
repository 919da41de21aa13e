#![allow(dead_code)]

use async_trait::async_trait;
use ragchat_core::{
    GeneratedAnswer, GroundingChunk, Operation, OperationHandle, RagError, RagService, Result,
    Sleeper, SourceFile, StoreId,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Every call the mock service received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateStore(String),
    Upload { store: String, file: String },
    Poll(String),
    Generate { store: String, prompt: String },
    Delete { store: String, force: bool },
}

/// Scripted in-memory RAG service.
#[derive(Default)]
pub struct MockRagService {
    calls: Mutex<Vec<Call>>,
    next_store: Mutex<usize>,
    create_error: Mutex<Option<RagError>>,
    upload_errors: Mutex<HashMap<String, RagError>>,
    operation_errors: Mutex<HashMap<String, String>>,
    polls_before_done: Mutex<usize>,
    poll_counts: Mutex<HashMap<String, usize>>,
    answers: Mutex<VecDeque<Result<GeneratedAnswer>>>,
    suggestion_text: Mutex<Option<String>>,
    delete_error: Mutex<Option<RagError>>,
    deleted: Notify,
}

impl MockRagService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self, error: RagError) {
        *self.create_error.lock().unwrap() = Some(error);
    }

    /// `upload_file` for `file_name` fails right away.
    pub fn fail_upload(&self, file_name: &str, error: RagError) {
        self.upload_errors
            .lock()
            .unwrap()
            .insert(file_name.to_string(), error);
    }

    /// The operation for `file_name` completes with an error.
    pub fn fail_operation(&self, file_name: &str, message: &str) {
        self.operation_errors
            .lock()
            .unwrap()
            .insert(file_name.to_string(), message.to_string());
    }

    /// Each operation reports `done == false` this many times before finishing.
    pub fn set_polls_before_done(&self, polls: usize) {
        *self.polls_before_done.lock().unwrap() = polls;
    }

    /// Queues the outcome of the next non-suggestion `generate_answer` call.
    pub fn push_answer(&self, answer: Result<GeneratedAnswer>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    /// Raw model text returned for suggestion prompts.
    pub fn set_suggestion_text(&self, text: &str) {
        *self.suggestion_text.lock().unwrap() = Some(text.to_string());
    }

    pub fn fail_delete(&self, error: RagError) {
        *self.delete_error.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Upload { file, .. } => Some(file),
                _ => None,
            })
            .collect()
    }

    pub fn suggestion_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(call, Call::Generate { prompt, .. } if is_suggestion_prompt(prompt))
            })
            .count()
    }

    pub fn deletes(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { store, force } => Some((store, force)),
                _ => None,
            })
            .collect()
    }

    /// Resolves once `delete_store` has been called at least `count` times.
    pub async fn wait_for_deletes(&self, count: usize) {
        loop {
            let notified = self.deleted.notified();
            if self.deletes().len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn is_suggestion_prompt(prompt: &str) -> bool {
    prompt.starts_with("You are analyzing documents")
}

fn operation_name(file_name: &str) -> String {
    format!("operations/{file_name}")
}

#[async_trait]
impl RagService for MockRagService {
    async fn create_store(&self, display_name: &str) -> Result<StoreId> {
        self.record(Call::CreateStore(display_name.to_string()));
        if let Some(err) = self.create_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut next = self.next_store.lock().unwrap();
        *next += 1;
        Ok(StoreId::new(format!("fileSearchStores/store-{}", *next)))
    }

    async fn upload_file(&self, store: &StoreId, file: &SourceFile) -> Result<Operation> {
        self.record(Call::Upload {
            store: store.to_string(),
            file: file.name.clone(),
        });
        if let Some(err) = self.upload_errors.lock().unwrap().get(&file.name).cloned() {
            return Err(err);
        }
        Ok(Operation::pending(OperationHandle::new(operation_name(&file.name))))
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> Result<Operation> {
        self.record(Call::Poll(handle.to_string()));
        let polls_before_done = *self.polls_before_done.lock().unwrap();

        let mut counts = self.poll_counts.lock().unwrap();
        let count = counts.entry(handle.to_string()).or_default();
        *count += 1;
        if *count <= polls_before_done {
            return Ok(Operation::pending(handle.clone()));
        }

        let file_name = handle.as_str().trim_start_matches("operations/");
        match self.operation_errors.lock().unwrap().get(file_name) {
            Some(message) => Ok(Operation::failed(handle.clone(), message.clone())),
            None => Ok(Operation::succeeded(handle.clone())),
        }
    }

    async fn generate_answer(&self, store: &StoreId, prompt: &str) -> Result<GeneratedAnswer> {
        self.record(Call::Generate {
            store: store.to_string(),
            prompt: prompt.to_string(),
        });

        if is_suggestion_prompt(prompt) {
            let text = self
                .suggestion_text
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| r#"["What is covered?", "Who wrote it?"]"#.to_string());
            return Ok(GeneratedAnswer {
                text,
                grounding_chunks: Vec::new(),
            });
        }

        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(answer_with_citation("The answer.", "manual.pdf")))
    }

    async fn delete_store(&self, store: &StoreId, force: bool) -> Result<()> {
        self.record(Call::Delete {
            store: store.to_string(),
            force,
        });
        self.deleted.notify_waiters();
        match self.delete_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn answer_with_citation(text: &str, title: &str) -> GeneratedAnswer {
    GeneratedAnswer {
        text: text.to_string(),
        grounding_chunks: vec![GroundingChunk {
            text: Some(format!("excerpt from {title}")),
            title: Some(title.to_string()),
            uri: None,
        }],
    }
}

pub fn files(names: &[&str]) -> Vec<SourceFile> {
    names
        .iter()
        .map(|name| SourceFile::new(*name, name.as_bytes().to_vec()))
        .collect()
}

/// Records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
